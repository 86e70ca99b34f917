//! `boardsync health`: check a running server's `/health` endpoint.

use std::time::Duration;

use boardsync::{client::HttpClient, model::UserId};

use crate::cli::HealthArgs;

pub async fn run(args: &HealthArgs) -> Result<(), Box<dyn std::error::Error>> {
    let base = server_base(&args.url);
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;
    // /health ignores the acting user
    let client = HttpClient::with_http(http, base, UserId::new())?;

    match client.health().await {
        Ok(body) if body.status == "healthy" => {
            println!("healthy: {} {}", client.base_url(), body.version);
            Ok(())
        }
        Ok(body) => {
            eprintln!("unhealthy: server reported status {}", body.status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("unhealthy: {base}: {e}");
            std::process::exit(1);
        }
    }
}

/// The server root, accepting URLs given with or without `/health`.
fn server_base(url: &str) -> &str {
    let url = url.trim_end_matches('/');
    url.strip_suffix("/health").unwrap_or(url)
}

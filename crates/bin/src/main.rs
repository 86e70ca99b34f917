mod cli;
mod commands;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::output::OutputFormat;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("boardsync=info")),
        )
        .init();

    // No subcommand: serve, still honouring the BOARDSYNC_* environment
    let command = match Cli::parse().command {
        Some(command) => command,
        None => Cli::parse_from(["boardsync", "serve"])
            .command
            .ok_or("serve command missing")?,
    };
    match command {
        Commands::Serve(args) => commands::serve::run(args).await,
        Commands::Health(args) => commands::health::run(&args).await,
        Commands::Info(args) => {
            let format = if args.json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            };
            commands::info::run(&args, format).await
        }
    }
}

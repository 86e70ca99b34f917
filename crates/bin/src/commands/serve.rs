//! Serve command - runs the board server.

use std::path::PathBuf;

use boardsync::{
    BoardService, api, constants::SNAPSHOT_FILE, hub::BoardHub, storage::Storage,
};
use tokio::signal::unix::{SignalKind, signal};

use crate::cli::ServeArgs;

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = args.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let snapshot_path = data_dir.join(SNAPSHOT_FILE);

    let storage = match Storage::load_from_file(&snapshot_path).await {
        Ok(storage) => {
            let stats = storage.stats().await;
            tracing::info!(
                path = %snapshot_path.display(),
                boards = stats.boards,
                tasks = stats.tasks,
                "loaded store"
            );
            storage
        }
        Err(e) => {
            tracing::warn!("Failed to load {}: {e}. Starting empty.", snapshot_path.display());
            Storage::new()
        }
    };

    let service = BoardService::new(storage, BoardHub::new());
    let app = api::router(service.clone());

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    println!("boardsync listening on http://{local_addr}");
    println!();
    println!("Available endpoints:");
    println!("  GET    /health                               - Health check");
    println!("  GET    /api/boards                           - Boards of the acting user");
    println!("  POST   /api/boards                           - Create a board");
    println!("  GET    /api/boards/{{id}}                      - Board with lists, tasks, members");
    println!("  GET    /api/boards/{{id}}/activity             - Recent activity");
    println!("  POST   /api/lists, /api/tasks                - Create lists and tasks");
    println!("  PUT    /api/tasks/{{id}}/move                  - Move a task");
    println!("  GET    /ws                                   - Real-time board events");
    println!();
    println!("Press Ctrl+C to shutdown");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
                _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
            }
        })
        .await?;

    // Persist once no handler can write any more
    match service.storage().save_to_file(&snapshot_path).await {
        Ok(()) => println!("\nStore saved to {}", snapshot_path.display()),
        Err(e) => {
            tracing::error!("Failed to save store: {e:?}");
            eprintln!("Failed to save store: {e}");
        }
    }

    println!("Server shut down");
    Ok(())
}

//! CLI argument definitions for the boardsync binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Real-time board server
#[derive(Parser, Debug)]
#[command(name = "boardsync")]
#[command(about = "boardsync: ordered boards kept in sync across clients")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the boardsync server
    Serve(ServeArgs),
    /// Check health of a running boardsync server
    Health(HealthArgs),
    /// Show what a data directory holds
    Info(InfoArgs),
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "BOARDSYNC_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "BOARDSYNC_HOST")]
    pub host: String,

    /// Data directory. The store is loaded from and saved to
    /// `boardsync.json` inside it.
    #[arg(short = 'D', long, env = "BOARDSYNC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Base URL of the server to check
    #[arg(long, default_value = "http://127.0.0.1:3000", env = "BOARDSYNC_URL")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}

/// Arguments for the info command
#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    /// Data directory to inspect
    #[arg(short = 'D', long, env = "BOARDSYNC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

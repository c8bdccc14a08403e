use clap::{Parser, Subcommand};

use crate::commands;
use crate::error::Result;

#[derive(Parser)]
#[command(name = "sectorpulse")]
#[command(about = "Stock market sector heatmap backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the server
    Serve,
    /// Run one refresh pass and persist the snapshot
    Pull,
    /// Show current cache status
    Status,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => commands::serve::run().await,
        Commands::Pull => commands::pull::run().await,
        Commands::Status => commands::status::run().await,
    }
}

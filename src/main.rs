mod cli;
mod commands;
mod config;
mod error;
mod models;
mod server;
mod services;
mod utils;
mod worker;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = cli::run().await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

use crate::commands::build_cache;
use crate::config::Config;
use crate::error::Result;
use crate::server;
use crate::worker;

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    println!("🚀 Starting sectorpulse server on port {}", config.port);
    println!("📁 Cache file: {}", config.cache_file.display());

    let cache = build_cache(&config)?;

    match cache.load_persisted().await {
        Some(age) => println!("✅ Loaded persisted snapshot ({}s old)", age.as_secs()),
        None => println!("ℹ️  No persisted snapshot, first request will fetch"),
    }

    if let Some(interval) = config.warm_interval {
        println!("🔄 Warm worker enabled (every {}s)", interval.as_secs());
        let warm_cache = cache.clone();
        tokio::spawn(async move {
            worker::run_warm_worker(warm_cache, interval).await;
        });
    }

    server::serve(cache, config.port).await
}

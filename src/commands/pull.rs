use crate::commands::build_cache;
use crate::config::Config;
use crate::error::Result;

/// One blocking refresh pass: fetch every symbol, aggregate, persist.
pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    println!("🔄 Pulling latest market data...");

    let cache = build_cache(&config)?;
    cache.refresh_if_idle().await?;

    let snapshot = cache.get_snapshot().await?;
    println!(
        "✅ Snapshot refreshed at {}",
        snapshot.last_updated.to_rfc3339()
    );
    println!("   Persisted to {}\n", config.cache_file.display());

    for bucket in &snapshot.sectors {
        println!(
            "   {:<24} {:>3} stocks   cap {:>14.0}   change {:+.2}%",
            bucket.sector,
            bucket.stocks.len(),
            bucket.total_market_cap,
            bucket.average_change
        );
    }

    Ok(())
}

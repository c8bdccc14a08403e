use crate::error::Result;
use crate::models::CacheEntry;
use crate::utils;

/// Report on the persisted snapshot without touching the upstream API.
pub async fn run() -> Result<()> {
    let cache_file = utils::get_cache_file();
    println!("📊 Heatmap Cache Status\n");

    let content = match tokio::fs::read_to_string(&cache_file).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("⚠️  No cached snapshot at {}. Run 'pull' first.", cache_file.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let entry: CacheEntry = match serde_json::from_str(&content) {
        Ok(entry) => entry,
        Err(e) => {
            println!("⚠️  Cache file is malformed ({}). Run 'pull' to rebuild.", e);
            return Ok(());
        }
    };

    let ttl_secs: u64 = std::env::var("CACHE_TTL_SECS")
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(900);
    let age = entry.age();
    let freshness = if age.as_secs() < ttl_secs {
        "fresh"
    } else if age.as_secs() < ttl_secs * 2 {
        "stale (would refresh in background)"
    } else {
        "expired (would refresh before serving)"
    };

    println!("   File:      {}", cache_file.display());
    println!("   Updated:   {}", entry.timestamp.to_rfc3339());
    println!("   Age:       {}s ({})", age.as_secs(), freshness);
    println!("   Sectors:   {}", entry.snapshot.sectors.len());
    let stocks: usize = entry.snapshot.sectors.iter().map(|b| b.stocks.len()).sum();
    println!("   Stocks:    {}", stocks);

    Ok(())
}

pub mod pull;
pub mod serve;
pub mod status;

use std::sync::Arc;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::SectorMap;
use crate::services::backoff::BackoffPolicy;
use crate::services::cache::{SharedSnapshotCache, SnapshotCache};
use crate::services::fetcher::SnapshotFetcher;
use crate::services::finnhub::FinnhubClient;
use crate::services::request_queue::RequestQueue;

/// Wire the full fetch pipeline behind a cache: upstream client, request
/// queue, backoff policy, fetcher, two cache tiers.
pub fn build_cache(config: &Config) -> Result<SharedSnapshotCache> {
    let sector_map = SectorMap::load(config.sector_map_file.as_deref())?;
    tracing::info!(
        sectors = sector_map.sector_count(),
        symbols = sector_map.symbol_count(),
        "Sector map loaded"
    );

    let mut client = FinnhubClient::new(&config.api_token, config.http_timeout)
        .map_err(|e| AppError::Network(format!("Failed to create upstream client: {}", e)))?;
    if let Some(base_url) = crate::utils::get_upstream_base_url() {
        tracing::info!(base_url = %base_url, "Using upstream base URL override");
        client = client.with_base_url(base_url);
    }

    let queue = Arc::new(RequestQueue::new(config.request_delay));
    let policy = BackoffPolicy {
        max_retries: config.max_retries,
        initial_backoff: config.initial_backoff,
        max_backoff: config.max_backoff,
    };

    let fetcher = SnapshotFetcher::new(Arc::new(client), queue, policy, sector_map);

    Ok(SnapshotCache::new(
        Arc::new(fetcher),
        config.cache_ttl,
        config.cache_file.clone(),
    ))
}

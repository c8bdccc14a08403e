use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::{HeatmapSnapshot, SectorMap, StockRecord};
use crate::services::aggregator;
use crate::services::backoff::{retry_rate_limited, BackoffPolicy};
use crate::services::cache::SnapshotSource;
use crate::services::finnhub::QuoteApi;
use crate::services::request_queue::RequestQueue;

/// Pulls quote and profile data for every configured symbol and assembles
/// complete heatmap snapshots.
///
/// The pass is strictly sequential: every upstream call goes through the
/// shared request queue, so symbols are spaced by the queue's delay no
/// matter how the fetcher is driven.
pub struct SnapshotFetcher {
    api: Arc<dyn QuoteApi>,
    queue: Arc<RequestQueue>,
    policy: BackoffPolicy,
    sector_map: SectorMap,
}

impl SnapshotFetcher {
    pub fn new(
        api: Arc<dyn QuoteApi>,
        queue: Arc<RequestQueue>,
        policy: BackoffPolicy,
        sector_map: SectorMap,
    ) -> Self {
        Self {
            api,
            queue,
            policy,
            sector_map,
        }
    }

    /// One full pass over the configured universe. Failed symbols are
    /// skipped; the pass itself never fails.
    pub async fn fetch_all(&self) -> Vec<StockRecord> {
        let symbols = self.sector_map.all_symbols();
        info!(symbols = symbols.len(), "Starting refresh pass");

        let mut records = Vec::with_capacity(symbols.len());
        for symbol in &symbols {
            match self.fetch_symbol(symbol).await {
                Some(record) => records.push(record),
                None => debug!(symbol = %symbol, "Symbol skipped"),
            }
        }

        info!(
            fetched = records.len(),
            skipped = symbols.len() - records.len(),
            "Refresh pass complete"
        );
        records
    }

    /// Quote and profile for one symbol, each serialized through the queue.
    /// A symbol is valid only if its quote arrives with a positive price;
    /// a missing profile degrades to fallback fields instead.
    async fn fetch_symbol(&self, symbol: &str) -> Option<StockRecord> {
        let quote = retry_rate_limited(&self.policy, "quote", || {
            self.queue.run(|| self.api.quote(symbol))
        })
        .await?;

        let price = quote.current_price.unwrap_or(0.0);
        if price <= 0.0 {
            warn!(symbol = %symbol, price, "Quote has no positive price, excluding symbol");
            return None;
        }

        let profile = retry_rate_limited(&self.policy, "profile", || {
            self.queue.run(|| self.api.profile(symbol))
        })
        .await;

        let (name, market_cap) = match profile {
            Some(profile) => (
                profile
                    .name
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| symbol.to_string()),
                profile.market_cap.unwrap_or(0.0),
            ),
            None => {
                warn!(symbol = %symbol, "Profile unavailable, using fallback fields");
                (symbol.to_string(), 0.0)
            }
        };

        Some(StockRecord {
            symbol: symbol.to_string(),
            name,
            price,
            change: quote.change.unwrap_or(0.0),
            change_percent: quote.change_percent.unwrap_or(0.0),
            market_cap,
            sector: self.sector_map.sector_for(symbol).to_string(),
            volume: quote.volume.unwrap_or(0),
            high: quote.high.unwrap_or(0.0),
            low: quote.low.unwrap_or(0.0),
            open: quote.open.unwrap_or(0.0),
            previous_close: quote.previous_close.unwrap_or(0.0),
        })
    }
}

#[async_trait]
impl SnapshotSource for SnapshotFetcher {
    async fn build_snapshot(&self) -> Result<HeatmapSnapshot> {
        let records = self.fetch_all().await;
        if records.is_empty() {
            return Err(AppError::Refresh(
                "no symbol produced a valid quote".to_string(),
            ));
        }
        Ok(aggregator::aggregate(records))
    }
}

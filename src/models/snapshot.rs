use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::StockRecord;

/// Aggregation unit for one sector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorBucket {
    pub sector: String,
    /// Members in order of first encounter during the refresh pass.
    pub stocks: Vec<StockRecord>,
    pub total_market_cap: f64,
    /// Market-cap weighted average change percent; 0 when the sector's
    /// total market cap is 0.
    pub average_change: f64,
}

/// One complete, internally consistent aggregation pass over all symbols.
/// The unit of caching and the `/api/heatmap` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapSnapshot {
    pub sectors: Vec<SectorBucket>,
    pub last_updated: DateTime<Utc>,
}

/// Persisted form of the last successful snapshot. Replaced on every
/// successful refresh, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: DateTime<Utc>,
    pub snapshot: HeatmapSnapshot,
}

impl CacheEntry {
    pub fn new(snapshot: HeatmapSnapshot) -> Self {
        Self {
            timestamp: snapshot.last_updated,
            snapshot,
        }
    }

    /// Age of the entry relative to the wall clock. A timestamp in the
    /// future (clock skew) counts as age zero.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.timestamp).to_std().unwrap_or_default()
    }
}

use crate::models::{HeatmapSnapshot, SectorBucket, StockRecord};
use chrono::Utc;
use std::collections::HashMap;
use tracing::debug;

/// Groups one refresh cycle's records into sector buckets.
///
/// Buckets appear in order of first encounter, members keep their encounter
/// order, and each bucket carries its total market cap and the market-cap
/// weighted average change percent. Output is deterministic for a given
/// input apart from the snapshot timestamp.
pub fn aggregate(records: Vec<StockRecord>) -> HeatmapSnapshot {
    let mut buckets: Vec<SectorBucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let idx = match index.get(&record.sector) {
            Some(&idx) => idx,
            None => {
                index.insert(record.sector.clone(), buckets.len());
                buckets.push(SectorBucket {
                    sector: record.sector.clone(),
                    stocks: Vec::new(),
                    total_market_cap: 0.0,
                    average_change: 0.0,
                });
                buckets.len() - 1
            }
        };

        let bucket = &mut buckets[idx];
        bucket.total_market_cap += record.market_cap;
        // Weighted sum until finalized below.
        bucket.average_change += record.change_percent * record.market_cap;
        bucket.stocks.push(record);
    }

    for bucket in &mut buckets {
        if bucket.total_market_cap > 0.0 {
            bucket.average_change /= bucket.total_market_cap;
        } else {
            bucket.average_change = 0.0;
        }
    }

    debug!(sectors = buckets.len(), "Aggregation complete");

    HeatmapSnapshot {
        sectors: buckets,
        last_updated: Utc::now(),
    }
}

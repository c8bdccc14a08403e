mod sector_map;
mod snapshot;
mod stock;

pub use sector_map::{SectorMap, OTHER_SECTOR};
pub use snapshot::{CacheEntry, HeatmapSnapshot, SectorBucket};
pub use stock::StockRecord;

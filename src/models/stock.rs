use serde::{Deserialize, Serialize};

/// One symbol's latest market data, as published to the frontend.
///
/// Records are immutable once fetched; a refresh cycle replaces them
/// wholesale rather than patching fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub market_cap: f64,
    pub sector: String,
    pub volume: u64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub previous_close: f64,
}

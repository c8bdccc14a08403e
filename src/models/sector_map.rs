use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};

/// Fallback sector for symbols that appear in no group.
pub const OTHER_SECTOR: &str = "Other";

/// Sector-to-symbol table driving the refresh universe.
///
/// The table is loaded configuration, not code: the built-in default can be
/// replaced by a JSON file of `{ "Sector": ["SYM", ...], ... }`. A symbol
/// assigned to more than one sector is a configuration error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorMap {
    #[serde(flatten)]
    pub groups: HashMap<String, Vec<String>>,
}

impl SectorMap {
    /// Load sector groups from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read sector map {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let groups: HashMap<String, Vec<String>> = serde_json::from_str(&content)?;
        let map = Self { groups };
        map.validate()?;
        Ok(map)
    }

    /// Load the override file when configured, the built-in table otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::load_default()),
        }
    }

    /// Built-in sector table for the US large-cap universe
    pub fn load_default() -> Self {
        let entries: [(&str, &[&str]); 8] = [
            ("Technology", &["AAPL", "MSFT", "NVDA", "AVGO", "ORCL", "CRM"]),
            ("Healthcare", &["LLY", "UNH", "JNJ", "ABBV", "MRK"]),
            ("Financial Services", &["JPM", "BAC", "WFC", "GS", "MS"]),
            ("Consumer Discretionary", &["AMZN", "TSLA", "HD", "MCD", "NKE"]),
            ("Communication Services", &["GOOGL", "META", "NFLX", "DIS"]),
            ("Energy", &["XOM", "CVX", "COP", "SLB"]),
            ("Industrials", &["CAT", "BA", "UPS", "HON"]),
            ("Consumer Staples", &["PG", "KO", "PEP", "WMT"]),
        ];

        let groups = entries
            .iter()
            .map(|(sector, symbols)| {
                (
                    sector.to_string(),
                    symbols.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();

        Self { groups }
    }

    /// Reject tables that assign a symbol to more than one sector
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        for sector in self.sector_names() {
            for symbol in &self.groups[&sector] {
                if !seen.insert(symbol.as_str()) {
                    return Err(AppError::Config(format!(
                        "Symbol {} is assigned to more than one sector",
                        symbol
                    )));
                }
            }
        }
        Ok(())
    }

    /// Sector names in deterministic (sorted) order
    pub fn sector_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.keys().cloned().collect();
        names.sort();
        names
    }

    /// All symbols, sector by sector in `sector_names` order
    pub fn all_symbols(&self) -> Vec<String> {
        self.sector_names()
            .iter()
            .flat_map(|sector| self.groups[sector].clone())
            .collect()
    }

    /// Sector for a symbol, falling back to [`OTHER_SECTOR`]
    pub fn sector_for(&self, symbol: &str) -> &str {
        for sector in self.groups.keys() {
            if self.groups[sector].iter().any(|s| s == symbol) {
                return sector;
            }
        }
        OTHER_SECTOR
    }

    pub fn sector_count(&self) -> usize {
        self.groups.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.groups.values().map(|v| v.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_map() -> SectorMap {
        let mut groups = HashMap::new();
        groups.insert(
            "Technology".to_string(),
            vec!["AAPL".to_string(), "MSFT".to_string()],
        );
        groups.insert("Healthcare".to_string(), vec!["JNJ".to_string()]);
        SectorMap { groups }
    }

    #[test]
    fn test_sector_map_structure() {
        let map = small_map();
        assert_eq!(map.sector_count(), 2);
        assert_eq!(map.symbol_count(), 3);
        assert_eq!(map.sector_names(), vec!["Healthcare", "Technology"]);
        assert_eq!(map.all_symbols(), vec!["JNJ", "AAPL", "MSFT"]);
    }

    #[test]
    fn test_sector_for_falls_back_to_other() {
        let map = small_map();
        assert_eq!(map.sector_for("AAPL"), "Technology");
        assert_eq!(map.sector_for("ZZZZ"), OTHER_SECTOR);
    }

    #[test]
    fn test_duplicate_assignment_rejected() {
        let mut groups = HashMap::new();
        groups.insert("Technology".to_string(), vec!["AAPL".to_string()]);
        groups.insert("Healthcare".to_string(), vec!["AAPL".to_string()]);
        let map = SectorMap { groups };

        let err = map.validate().unwrap_err();
        assert!(err.to_string().contains("AAPL"));
    }

    #[test]
    fn test_default_map_is_valid() {
        let map = SectorMap::load_default();
        assert!(map.validate().is_ok());
        assert!(map.symbol_count() > 30);
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sectors.json");
        std::fs::write(&path, r#"{"Technology": ["AAPL"], "Energy": ["XOM"]}"#).unwrap();

        let map = SectorMap::from_file(&path).unwrap();
        assert_eq!(map.sector_names(), vec!["Energy", "Technology"]);
    }

    #[test]
    fn test_from_file_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sectors.json");
        std::fs::write(&path, r#"{"Technology": ["XOM"], "Energy": ["XOM"]}"#).unwrap();

        assert!(SectorMap::from_file(&path).is_err());
    }
}

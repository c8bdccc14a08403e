use std::path::PathBuf;

/// Get cache file path from environment variable or use default
pub fn get_cache_file() -> PathBuf {
    std::env::var("CACHE_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("cache/heatmap.json"))
}

/// Get sector map override path, if configured
pub fn get_sector_map_file() -> Option<PathBuf> {
    std::env::var("SECTOR_MAP_FILE").ok().map(PathBuf::from)
}

/// Get upstream API base URL override, if configured
pub fn get_upstream_base_url() -> Option<String> {
    std::env::var("UPSTREAM_BASE_URL").ok()
}

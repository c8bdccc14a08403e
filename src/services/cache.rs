//! Two-tier snapshot cache with stale-while-revalidate semantics.
//!
//! An in-memory entry sits in front of a single JSON file on disk. Reads
//! classify the freshest available entry by age: fresh entries are served
//! as-is, stale-but-usable entries are served while a detached refresh
//! runs, and anything older forces a blocking refresh with the old entry
//! kept as a last resort. At most one refresh runs at a time.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::{CacheEntry, HeatmapSnapshot};

/// Anything that can produce a complete heatmap snapshot.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn build_snapshot(&self) -> Result<HeatmapSnapshot>;
}

pub type SharedSnapshotCache = Arc<SnapshotCache>;

pub struct SnapshotCache {
    source: Arc<dyn SnapshotSource>,
    ttl: Duration,
    cache_file: PathBuf,
    memory: RwLock<Option<CacheEntry>>,
    /// Held for the duration of a refresh. `try_lock` is the atomic
    /// check-and-set that keeps refreshes single-flight.
    refresh_guard: Mutex<()>,
}

impl SnapshotCache {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        ttl: Duration,
        cache_file: PathBuf,
    ) -> SharedSnapshotCache {
        Arc::new(Self {
            source,
            ttl,
            cache_file,
            memory: RwLock::new(None),
            refresh_guard: Mutex::new(()),
        })
    }

    /// Resolve a snapshot request against both tiers.
    ///
    /// Entries younger than the TTL are served directly. Entries younger
    /// than twice the TTL are served immediately while a detached refresh
    /// replaces them. Older entries trigger a blocking refresh and are
    /// only served if that refresh fails.
    pub async fn get_snapshot(self: &Arc<Self>) -> Result<HeatmapSnapshot> {
        let entry = match self.current_entry().await {
            Some(entry) => entry,
            None => {
                return self.refresh_blocking().await.map_err(|e| {
                    warn!(error = %e, "Refresh failed with no cached fallback");
                    AppError::CacheUnavailable
                });
            }
        };

        let age = entry.age();
        if age < self.ttl {
            debug!(age_secs = age.as_secs(), "Serving fresh snapshot");
            return Ok(entry.snapshot);
        }

        if age < self.ttl * 2 {
            info!(
                age_secs = age.as_secs(),
                "Serving stale snapshot and refreshing in background"
            );
            self.spawn_background_refresh();
            return Ok(entry.snapshot);
        }

        // Too old to serve outright; keep it only as a last resort.
        match self.refresh_blocking().await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                warn!(
                    error = %e,
                    age_secs = age.as_secs(),
                    "Refresh failed, serving last-resort stale snapshot"
                );
                Ok(entry.snapshot)
            }
        }
    }

    /// Load the persisted entry into memory at startup so the first
    /// request does not have to touch the disk tier. Returns the entry's
    /// age when one was found.
    pub async fn load_persisted(&self) -> Option<Duration> {
        let entry = self.current_entry().await?;
        Some(entry.age())
    }

    /// Run a refresh now unless one is already in flight. Returns `false`
    /// when the refresh was skipped because another one holds the guard.
    pub async fn refresh_if_idle(&self) -> Result<bool> {
        let Ok(_held) = self.refresh_guard.try_lock() else {
            debug!("Refresh already in flight, skipping");
            return Ok(false);
        };
        self.refresh_locked().await?;
        Ok(true)
    }

    /// Memory entry if present, otherwise the disk entry promoted into
    /// memory. `None` means neither tier has anything usable.
    async fn current_entry(&self) -> Option<CacheEntry> {
        if let Some(entry) = self.memory.read().await.as_ref() {
            return Some(entry.clone());
        }

        let entry = self.read_disk().await?;
        debug!("Loaded persisted snapshot into memory");
        *self.memory.write().await = Some(entry.clone());
        Some(entry)
    }

    /// Blocking refresh path. Whichever caller wins the guard does the
    /// upstream pass; callers that waited pick up its result from memory
    /// instead of duplicating work.
    async fn refresh_blocking(self: &Arc<Self>) -> Result<HeatmapSnapshot> {
        let _held = self.refresh_guard.lock().await;

        if let Some(entry) = self.memory.read().await.as_ref() {
            if entry.age() < self.ttl {
                return Ok(entry.snapshot.clone());
            }
        }

        self.refresh_locked().await
    }

    /// Fire-and-forget refresh for the stale-while-revalidate path. A
    /// no-op when a refresh is already in flight; the caller never awaits.
    fn spawn_background_refresh(self: &Arc<Self>) {
        let cache = self.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.refresh_if_idle().await {
                warn!(error = %e, "Background refresh failed");
            }
        });
    }

    /// The single refresh function shared by every path. The caller must
    /// hold `refresh_guard`.
    async fn refresh_locked(&self) -> Result<HeatmapSnapshot> {
        info!("Refreshing heatmap snapshot");
        let snapshot = self.source.build_snapshot().await?;
        let entry = CacheEntry::new(snapshot.clone());

        // A failed write degrades durability, not the response.
        if let Err(e) = self.write_disk(&entry).await {
            warn!(error = %e, file = %self.cache_file.display(), "Failed to persist snapshot");
        }
        *self.memory.write().await = Some(entry);

        info!(
            sectors = snapshot.sectors.len(),
            "Snapshot refreshed and cached"
        );
        Ok(snapshot)
    }

    /// Read the persisted entry. Missing and malformed files are both
    /// cache misses; corruption is logged, never fatal.
    async fn read_disk(&self) -> Option<CacheEntry> {
        let content = match tokio::fs::read_to_string(&self.cache_file).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(error = %e, file = %self.cache_file.display(), "Failed to read cache file");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(
                    error = %e,
                    file = %self.cache_file.display(),
                    "Cache file is malformed, treating as empty"
                );
                None
            }
        }
    }

    /// Replace the persisted entry via a temp-file rename so a crash never
    /// leaves a half-written snapshot behind.
    async fn write_disk(&self, entry: &CacheEntry) -> Result<()> {
        if let Some(parent) = self.cache_file.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string(entry)?;
        let tmp = self.cache_file.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.cache_file).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SectorBucket, StockRecord};
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TTL: Duration = Duration::from_secs(900);

    fn snapshot() -> HeatmapSnapshot {
        HeatmapSnapshot {
            sectors: vec![SectorBucket {
                sector: "Technology".to_string(),
                stocks: vec![StockRecord {
                    symbol: "AAPL".to_string(),
                    name: "Apple Inc".to_string(),
                    price: 178.0,
                    change: 2.3,
                    change_percent: 1.31,
                    market_cap: 2_800_000.0,
                    sector: "Technology".to_string(),
                    volume: 10_000,
                    high: 180.0,
                    low: 176.2,
                    open: 177.0,
                    previous_close: 176.2,
                }],
                total_market_cap: 2_800_000.0,
                average_change: 1.31,
            }],
            last_updated: Utc::now(),
        }
    }

    struct CountingSource {
        calls: AtomicU32,
        fail: bool,
        delay: Duration,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail: false,
                delay: Duration::ZERO,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new()
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SnapshotSource for CountingSource {
        async fn build_snapshot(&self) -> Result<HeatmapSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(AppError::Refresh("upstream down".to_string()));
            }
            Ok(snapshot())
        }
    }

    fn cache_with(
        source: Arc<CountingSource>,
        dir: &tempfile::TempDir,
    ) -> SharedSnapshotCache {
        SnapshotCache::new(source, TTL, dir.path().join("heatmap.json"))
    }

    async fn seed_disk(dir: &tempfile::TempDir, age: chrono::Duration) {
        let mut snap = snapshot();
        snap.last_updated = Utc::now() - age;
        let entry = CacheEntry::new(snap);
        let json = serde_json::to_string(&entry).unwrap();
        tokio::fs::write(dir.path().join("heatmap.json"), json)
            .await
            .unwrap();
    }

    async fn wait_for_calls(source: &CountingSource, expected: u32) {
        for _ in 0..100 {
            if source.calls() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("source never reached {} calls", expected);
    }

    #[tokio::test]
    async fn test_cold_miss_refreshes_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(CountingSource::new());
        let cache = cache_with(source.clone(), &dir);

        let result = cache.get_snapshot().await.unwrap();

        assert_eq!(result.sectors.len(), 1);
        assert_eq!(source.calls(), 1);
        assert!(dir.path().join("heatmap.json").exists());
    }

    #[tokio::test]
    async fn test_fresh_reads_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(CountingSource::new());
        let cache = cache_with(source.clone(), &dir);

        let first = cache.get_snapshot().await.unwrap();
        let second = cache.get_snapshot().await.unwrap();

        assert_eq!(first.last_updated, second.last_updated);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_fresh_disk_entry_served_without_refresh() {
        let dir = tempfile::tempdir().unwrap();
        seed_disk(&dir, chrono::Duration::minutes(5)).await;

        let source = Arc::new(CountingSource::new());
        let cache = cache_with(source.clone(), &dir);

        let result = cache.get_snapshot().await.unwrap();

        assert_eq!(result.sectors[0].sector, "Technology");
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_disk_entry_served_with_one_background_refresh() {
        let dir = tempfile::tempdir().unwrap();
        seed_disk(&dir, chrono::Duration::minutes(20)).await;

        let source = Arc::new(CountingSource::new());
        let cache = cache_with(source.clone(), &dir);

        let stale_stamp = Utc::now() - chrono::Duration::minutes(20);
        let result = cache.get_snapshot().await.unwrap();

        // The stale snapshot comes back immediately.
        assert!(result.last_updated - stale_stamp < chrono::Duration::seconds(5));

        wait_for_calls(&source, 1).await;

        // The detached refresh replaces both tiers; observe memory directly
        // so polling does not itself trigger more refreshes.
        for _ in 0..100 {
            let fresh = cache
                .memory
                .read()
                .await
                .as_ref()
                .is_some_and(|entry| entry.timestamp > stale_stamp + chrono::Duration::minutes(1));
            if fresh {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(source.calls(), 1);
        let persisted: CacheEntry = serde_json::from_str(
            &tokio::fs::read_to_string(dir.path().join("heatmap.json"))
                .await
                .unwrap(),
        )
        .unwrap();
        assert!(persisted.timestamp > stale_stamp + chrono::Duration::minutes(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_cold_reads_are_single_flight() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(CountingSource::slow(Duration::from_secs(1)));
        let cache = cache_with(source.clone(), &dir);

        let (first, second) = tokio::join!(cache.get_snapshot(), cache.get_snapshot());

        assert_eq!(source.calls(), 1);
        assert_eq!(
            first.unwrap().last_updated,
            second.unwrap().last_updated
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_falls_back_to_ancient_disk_entry() {
        let dir = tempfile::tempdir().unwrap();
        seed_disk(&dir, chrono::Duration::hours(6)).await;

        let source = Arc::new(CountingSource::failing());
        let cache = cache_with(source.clone(), &dir);

        let result = cache.get_snapshot().await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(result.sectors[0].sector, "Technology");
    }

    #[tokio::test]
    async fn test_failed_refresh_with_nothing_cached_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(CountingSource::failing());
        let cache = cache_with(source.clone(), &dir);

        let err = cache.get_snapshot().await.unwrap_err();
        assert!(matches!(err, AppError::CacheUnavailable));
    }

    #[tokio::test]
    async fn test_malformed_disk_entry_treated_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("heatmap.json"), "{not json")
            .await
            .unwrap();

        let source = Arc::new(CountingSource::new());
        let cache = cache_with(source.clone(), &dir);

        let result = cache.get_snapshot().await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(result.sectors.len(), 1);
    }

    #[tokio::test]
    async fn test_load_persisted_reports_age() {
        let dir = tempfile::tempdir().unwrap();
        seed_disk(&dir, chrono::Duration::minutes(5)).await;

        let source = Arc::new(CountingSource::new());
        let cache = cache_with(source.clone(), &dir);

        let age = cache.load_persisted().await.unwrap();
        assert!(age >= Duration::from_secs(4 * 60));
        assert!(cache.memory.read().await.is_some());
        assert_eq!(source.calls(), 0);

        let empty_dir = tempfile::tempdir().unwrap();
        let cold = cache_with(source.clone(), &empty_dir);
        assert!(cold.load_persisted().await.is_none());
    }

    #[tokio::test]
    async fn test_refresh_if_idle_reports_skip() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(CountingSource::new());
        let cache = cache_with(source.clone(), &dir);

        let guard = cache.refresh_guard.lock().await;
        assert!(!cache.refresh_if_idle().await.unwrap());
        drop(guard);

        assert!(cache.refresh_if_idle().await.unwrap());
        assert_eq!(source.calls(), 1);
    }
}

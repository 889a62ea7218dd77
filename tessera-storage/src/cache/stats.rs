//! Cache usage counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of reads served from the in-memory map.
    pub hits: u64,
    /// Number of reads that missed the in-memory map.
    pub misses: u64,
    /// Number of single-record fetches sent to the store.
    pub store_fetches: u64,
    /// Number of entries inserted after the store reported an existing record.
    pub backfills: u64,
    /// Number of mutations the store failed to complete.
    pub store_failures: u64,
    /// Number of entries currently in the map.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    store_fetches: AtomicU64,
    backfills: AtomicU64,
    store_failures: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn store_fetch(&self) {
        self.store_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn backfill(&self) {
        self.backfills.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entry_count: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            store_fetches: self.store_fetches.load(Ordering::Relaxed),
            backfills: self.backfills.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            entry_count: entry_count as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = StatsCounters::default();
        counters.hit();
        counters.hit();
        counters.miss();
        counters.store_fetch();
        counters.backfill();
        counters.store_failure();

        let stats = counters.snapshot(4);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.store_fetches, 1);
        assert_eq!(stats.backfills, 1);
        assert_eq!(stats.store_failures, 1);
        assert_eq!(stats.entry_count, 4);
    }
}

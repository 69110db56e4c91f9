//! Cache metrics, recorded through the `metrics` facade.
//!
//! Nothing is exported unless the binary installs a recorder.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Metric names for the caching engine.
pub mod names {
    /// Reads answered from a store.
    pub const CACHE_HITS_TOTAL: &str = "meridian_cache_hits_total";
    /// Reads that fell through to the wrapped operation.
    pub const CACHE_MISSES_TOTAL: &str = "meridian_cache_misses_total";
    /// Entries written.
    pub const CACHE_PUTS_TOTAL: &str = "meridian_cache_puts_total";
    /// Single-key evictions and full clears.
    pub const CACHE_EVICTIONS_TOTAL: &str = "meridian_cache_evictions_total";
    /// Swallowed or surfaced cache-layer failures.
    pub const CACHE_ERRORS_TOTAL: &str = "meridian_cache_errors_total";
    /// Stores in the manager registry.
    pub const CACHE_STORES: &str = "meridian_cache_stores";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::CACHE_HITS_TOTAL, "Total number of cache hits");
    describe_counter!(names::CACHE_MISSES_TOTAL, "Total number of cache misses");
    describe_counter!(names::CACHE_PUTS_TOTAL, "Total number of cache entries written");
    describe_counter!(
        names::CACHE_EVICTIONS_TOTAL,
        "Total number of cache evictions and clears"
    );
    describe_counter!(
        names::CACHE_ERRORS_TOTAL,
        "Total number of cache-layer failures by operation"
    );
    describe_gauge!(names::CACHE_STORES, "Number of cache stores created");
}

/// Cache metrics recorder.
#[derive(Clone)]
pub struct CacheMetrics;

impl CacheMetrics {
    /// Record a hit.
    pub fn hit(cache: &str) {
        counter!(names::CACHE_HITS_TOTAL, "cache" => cache.to_string()).increment(1);
    }

    /// Record a miss.
    pub fn miss(cache: &str) {
        counter!(names::CACHE_MISSES_TOTAL, "cache" => cache.to_string()).increment(1);
    }

    /// Record a put.
    pub fn put(cache: &str) {
        counter!(names::CACHE_PUTS_TOTAL, "cache" => cache.to_string()).increment(1);
    }

    /// Record an eviction or clear.
    pub fn eviction(cache: &str) {
        counter!(names::CACHE_EVICTIONS_TOTAL, "cache" => cache.to_string()).increment(1);
    }

    /// Record a failure of `op` (`get`, `put`, `evict`, `clear`, `decode`, `encode`, `key`).
    pub fn error(cache: &str, op: &'static str) {
        counter!(
            names::CACHE_ERRORS_TOTAL,
            "cache" => cache.to_string(),
            "op" => op
        )
        .increment(1);
    }

    /// Update the registry size.
    pub fn stores(count: usize) {
        gauge!(names::CACHE_STORES).set(count as f64);
    }
}

//! Cache statistics snapshot.

/// Point-in-time counters for an [`OverlayDataCache`](super::OverlayDataCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups served from a live entry
    pub hits: u64,
    /// Lookups that invoked the fetch function
    pub misses: u64,
    /// Entries evicted because their TTL elapsed
    pub expired: u64,
    /// Entries currently stored
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of `get_or_fetch` calls served from cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

use std::net::IpAddr;

/// Hostname-to-addresses cache with TTL expiry and LRU eviction.
///
/// All operations are non-blocking; implementations serialize access
/// internally and must not suspend inside the critical section.
pub trait HostCache: Send + Sync {
    /// Fresh entries are promoted to most-recently-used and counted as a
    /// hit; expired entries are evicted and counted as a miss.
    fn get(&self, hostname: &str) -> Option<Vec<IpAddr>>;

    /// Read an entry without promoting it, counting it, or honouring
    /// expiry. Used to observe the previous address set for change
    /// detection.
    fn peek(&self, hostname: &str) -> Option<Vec<IpAddr>>;

    /// Insert or replace, resetting the entry's expiry. Inserting into a
    /// full cache evicts the least-recently-used entry first.
    fn put(&self, hostname: &str, addresses: &[IpAddr]);

    fn remove(&self, hostname: &str);

    /// Drop all entries and reset the hit/miss counters.
    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// hits / (hits + misses), in [0, 1]; 0.0 before the first lookup.
    fn hit_rate(&self) -> f64;
}

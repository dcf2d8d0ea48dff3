use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use hostwatch_application::ports::HostCache;
use hostwatch_domain::CacheConfig;
use lru::LruCache;
use tracing::{debug, info};

use crate::sync::lock;

struct CacheEntry {
    addresses: Vec<IpAddr>,
    expires_at: Instant,
}

/// Bounded LRU cache with per-entry expiry and hit/miss accounting.
///
/// Access is serialized on a single mutex; the critical section never
/// suspends. Expired entries are swept opportunistically at the start of
/// every `get`, so memory stays bounded by `max_size` without a periodic
/// sweeper.
pub struct TtlLruCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TtlLruCache {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN);
        info!(
            max_size = capacity.get(),
            ttl_ms = ttl.as_millis() as u64,
            "Initializing host cache"
        );
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_size, Duration::from_millis(config.ttl_ms))
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(AtomicOrdering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(AtomicOrdering::Relaxed)
    }

    fn sweep_expired(entries: &mut LruCache<String, CacheEntry>, now: Instant) {
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(hostname, _)| hostname.clone())
            .collect();
        for hostname in expired {
            entries.pop(&hostname);
            debug!(hostname = %hostname, "Evicted expired cache entry");
        }
    }
}

impl HostCache for TtlLruCache {
    fn get(&self, hostname: &str) -> Option<Vec<IpAddr>> {
        let mut entries = lock(&self.entries);
        Self::sweep_expired(&mut entries, Instant::now());

        // The sweep removed everything stale, so any remaining entry is a
        // fresh hit; LruCache::get promotes it to most-recently-used.
        match entries.get(hostname) {
            Some(entry) => {
                self.hits.fetch_add(1, AtomicOrdering::Relaxed);
                Some(entry.addresses.clone())
            }
            None => {
                self.misses.fetch_add(1, AtomicOrdering::Relaxed);
                None
            }
        }
    }

    fn peek(&self, hostname: &str) -> Option<Vec<IpAddr>> {
        let entries = lock(&self.entries);
        entries.peek(hostname).map(|entry| entry.addresses.clone())
    }

    fn put(&self, hostname: &str, addresses: &[IpAddr]) {
        let entry = CacheEntry {
            addresses: addresses.to_vec(),
            expires_at: Instant::now() + self.ttl,
        };
        let mut entries = lock(&self.entries);
        entries.put(hostname.to_string(), entry);
        debug!(hostname = %hostname, addresses = addresses.len(), "Cached addresses");
    }

    fn remove(&self, hostname: &str) {
        let mut entries = lock(&self.entries);
        entries.pop(hostname);
    }

    fn clear(&self) {
        let mut entries = lock(&self.entries);
        entries.clear();
        self.hits.store(0, AtomicOrdering::Relaxed);
        self.misses.store(0, AtomicOrdering::Relaxed);
        info!("Host cache cleared");
    }

    fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(AtomicOrdering::Relaxed) as f64;
        let total = hits + self.misses.load(AtomicOrdering::Relaxed) as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

mod ttl_lru;

pub use ttl_lru::TtlLruCache;

use serde::{Deserialize, Serialize};

/// TTL-bounded LRU cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Entry lifetime in milliseconds. The legacy key `ttl_seconds` is
    /// accepted; its values were always milliseconds in practice.
    #[serde(default = "default_ttl_ms", alias = "ttl_seconds")]
    pub ttl_ms: u64,

    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Reserved: persistence hooks exist, the policy does not.
    #[serde(default)]
    pub persistent: bool,

    #[serde(default)]
    pub cache_file: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            ttl_ms: default_ttl_ms(),
            max_size: default_max_size(),
            persistent: false,
            cache_file: String::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_ttl_ms() -> u64 {
    300_000
}

fn default_max_size() -> usize {
    10_000
}

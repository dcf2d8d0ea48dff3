use serde::{Deserialize, Serialize};

use super::cache::CacheConfig;
use super::errors::ConfigError;
use super::global::GlobalConfig;
use super::metrics::MetricsConfig;
use super::retry::RetryConfig;
use super::server::ServerConfig;

/// Main configuration snapshot for the resolution service.
///
/// Snapshots are immutable values: in-flight resolutions keep the snapshot
/// captured at dispatch and never observe a later update.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Upstream recursive servers, in priority order (at least one).
    #[serde(default)]
    pub servers: Vec<ServerConfig>,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub global: GlobalConfig,

    #[serde(default)]
    pub metadata: Metadata,
}

impl ResolverConfig {
    /// A minimal usable snapshot with the given upstream addresses.
    pub fn with_servers<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            servers: addresses.into_iter().map(ServerConfig::new).collect(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.servers.is_empty() {
            return Err(ConfigError::rejected("no upstream servers configured"));
        }

        for server in &self.servers {
            if server.address.is_empty() {
                return Err(ConfigError::rejected(
                    "upstream server address cannot be empty",
                ));
            }
        }

        let timeout = self.global.query_timeout_ms;
        if !(100..=30_000).contains(&timeout) {
            return Err(ConfigError::rejected(format!(
                "query_timeout_ms {} outside 100..=30000",
                timeout
            )));
        }

        if !(1..=10).contains(&self.retry.max_attempts) {
            return Err(ConfigError::rejected(format!(
                "retry.max_attempts {} outside 1..=10",
                self.retry.max_attempts
            )));
        }
        if self.retry.base_delay_ms < 10 {
            return Err(ConfigError::rejected(
                "retry.base_delay_ms must be at least 10",
            ));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigError::rejected(
                "retry.max_delay_ms must not be below retry.base_delay_ms",
            ));
        }

        if self.cache.max_size == 0 {
            return Err(ConfigError::rejected("cache.max_size must be at least 1"));
        }
        if self.global.max_concurrent_queries == 0 {
            return Err(ConfigError::rejected(
                "max_concurrent_queries must be at least 1",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Metadata {
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            version: default_version(),
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

use serde::{Deserialize, Serialize};

/// Process-wide resolution settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Per-attempt query timeout, validated to 100..=30000.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u32,

    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: u32,

    /// Dual-stack (A + AAAA) lookups when true, A-only otherwise.
    #[serde(default = "default_ipv6_enabled")]
    pub ipv6_enabled: bool,

    /// Consecutive errors after which an upstream is marked unhealthy.
    #[serde(default = "default_server_error_threshold")]
    pub server_error_threshold: u32,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: default_query_timeout_ms(),
            max_concurrent_queries: default_max_concurrent_queries(),
            ipv6_enabled: default_ipv6_enabled(),
            server_error_threshold: default_server_error_threshold(),
        }
    }
}

fn default_query_timeout_ms() -> u32 {
    5000
}

fn default_max_concurrent_queries() -> u32 {
    100
}

fn default_ipv6_enabled() -> bool {
    true
}

fn default_server_error_threshold() -> u32 {
    10
}

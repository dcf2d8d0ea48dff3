use serde::{Deserialize, Serialize};

/// One upstream recursive DNS server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// IP address of the upstream (e.g. "8.8.8.8").
    pub address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Relative weight in the latency-weighted selection score.
    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Reserved: per-server timeout is parsed but dispatch uses the global
    /// query timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ServerConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: default_port(),
            weight: default_weight(),
            timeout_ms: default_timeout_ms(),
            enabled: default_enabled(),
        }
    }
}

fn default_port() -> u16 {
    53
}

fn default_weight() -> u32 {
    1
}

fn default_timeout_ms() -> u32 {
    2000
}

fn default_enabled() -> bool {
    true
}

use serde::{Deserialize, Serialize};

/// Exponential-backoff retry policy for transient upstream failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u32,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u32,
}

impl RetryConfig {
    /// Delay before the retry following `retry_count` completed attempts:
    /// `min(base * 2^retry_count, max)`.
    pub fn backoff_delay_ms(&self, retry_count: u32) -> u64 {
        let base = u64::from(self.base_delay_ms);
        let scaled = match retry_count {
            n if n >= 63 => u64::MAX,
            n => base.saturating_mul(1u64 << n),
        };
        scaled.min(u64::from(self.max_delay_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u32 {
    100
}

fn default_max_delay_ms() -> u32 {
    1000
}

use serde::{Deserialize, Serialize};

/// Metrics engine and report-file settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// When nonempty, the Prometheus text export is written here on every
    /// report interval.
    #[serde(default)]
    pub file: String,

    #[serde(default = "default_report_interval_sec")]
    pub report_interval_sec: u32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            file: String::new(),
            report_interval_sec: default_report_interval_sec(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_report_interval_sec() -> u32 {
    60
}

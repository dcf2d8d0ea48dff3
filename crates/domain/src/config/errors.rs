use thiserror::Error;

/// Failure while loading, persisting, or vetting a configuration snapshot.
/// A rejected snapshot never replaces the one currently in effect.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Config file I/O failed for {path}: {detail}")]
    Io { path: String, detail: String },

    #[error("Malformed config JSON: {0}")]
    Malformed(String),

    #[error("Rejected config snapshot: {0}")]
    Rejected(String),
}

impl ConfigError {
    pub fn io(path: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.into(),
            detail: detail.to_string(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

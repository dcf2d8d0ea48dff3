use crate::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ResolverError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("Invalid upstream server address: {0}")]
    InvalidServerAddress(String),

    #[error("Resolver not initialized")]
    NotInitialized,

    #[error("Event subscriber failed: {0}")]
    Subscriber(String),

    #[error("I/O error: {0}")]
    Io(String),
}

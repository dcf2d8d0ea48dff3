pub mod config;
pub mod errors;
pub mod events;
pub mod hostname;
pub mod resolution;

pub use config::{
    CacheConfig, ConfigError, GlobalConfig, Metadata, MetricsConfig, ResolverConfig, RetryConfig,
    ServerConfig,
};
pub use errors::ResolverError;
pub use events::AddressChangeEvent;
pub use resolution::{ResolveResult, ResolveStatus};

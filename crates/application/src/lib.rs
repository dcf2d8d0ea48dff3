pub mod ports;
pub mod registry;

pub use ports::{HostCache, QueryStrategy};
pub use registry::{CacheFactory, PluginRegistry, StrategyFactory};

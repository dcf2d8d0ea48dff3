mod host_cache;
mod query_strategy;

pub use host_cache::HostCache;
pub use query_strategy::QueryStrategy;

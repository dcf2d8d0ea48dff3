pub mod cache;
pub mod config_store;
pub mod events;
pub mod metrics;
pub mod resolver;
pub mod selection;
pub mod strategy;

mod sync;

pub use cache::TtlLruCache;
pub use config_store::ConfigStore;
pub use events::{AddressChangeHandler, EventBus, QueryCompleteHandler, QueryStartHandler};
pub use metrics::{
    AlertThresholds, MetricsEngine, MetricsReporter, MetricsSummary, PerformanceSnapshot,
    RunningStats,
};
pub use resolver::{Resolver, ResolverBuilder};
pub use selection::{ServerHealth, ServerSelector};
pub use strategy::RecursiveQueryStrategy;

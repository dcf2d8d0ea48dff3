use std::sync::Arc;

use hostwatch_application::registry::{CacheFactory, PluginRegistry, StrategyFactory};

use super::core::{Resolver, BUILTIN_CACHE, BUILTIN_STRATEGY};
use crate::config_store::ConfigStore;
use crate::events::EventBus;
use crate::metrics::MetricsEngine;

/// Assembles a [`Resolver`] with optional shared components and
/// embedder-provided plugins.
pub struct ResolverBuilder {
    config: Arc<ConfigStore>,
    metrics: Option<Arc<MetricsEngine>>,
    events: Option<Arc<EventBus>>,
    strategy_name: String,
    cache_name: String,
    registry: PluginRegistry,
}

impl ResolverBuilder {
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self {
            config,
            metrics: None,
            events: None,
            strategy_name: BUILTIN_STRATEGY.to_string(),
            cache_name: BUILTIN_CACHE.to_string(),
            registry: PluginRegistry::new(),
        }
    }

    /// Share a metrics engine with the embedding process instead of letting
    /// the resolver create its own.
    pub fn with_metrics(mut self, metrics: Arc<MetricsEngine>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Select the active query strategy by registry name.
    pub fn with_strategy(mut self, name: impl Into<String>) -> Self {
        self.strategy_name = name.into();
        self
    }

    /// Select the active cache by registry name.
    pub fn with_cache(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    pub fn register_strategy_factory(
        mut self,
        name: impl Into<String>,
        factory: StrategyFactory,
    ) -> Self {
        self.registry.register_strategy_factory(name, factory);
        self
    }

    pub fn register_cache_factory(
        mut self,
        name: impl Into<String>,
        factory: CacheFactory,
    ) -> Self {
        self.registry.register_cache_factory(name, factory);
        self
    }

    pub fn build(self) -> Resolver {
        Resolver::from_parts(
            self.config,
            self.metrics.unwrap_or_default(),
            self.events.unwrap_or_default(),
            self.registry,
            self.strategy_name,
            self.cache_name,
        )
    }
}

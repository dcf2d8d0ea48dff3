use std::collections::HashMap;
use std::sync::Arc;

use hostwatch_domain::{CacheConfig, ResolverConfig, ResolverError};
use tracing::{debug, info};

use crate::ports::{HostCache, QueryStrategy};

pub type StrategyFactory =
    Box<dyn Fn(&ResolverConfig) -> Result<Arc<dyn QueryStrategy>, ResolverError> + Send + Sync>;

pub type CacheFactory =
    Box<dyn Fn(&CacheConfig) -> Result<Arc<dyn HostCache>, ResolverError> + Send + Sync>;

/// Name-to-factory registry for query strategies and caches.
///
/// Physical loading of external plugin modules is out of scope; built-ins
/// and embedder-provided factories register closures here and are
/// instantiated by name.
#[derive(Default)]
pub struct PluginRegistry {
    strategy_factories: HashMap<String, StrategyFactory>,
    cache_factories: HashMap<String, CacheFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_strategy_factory(&mut self, name: impl Into<String>, factory: StrategyFactory) {
        let name = name.into();
        debug!(plugin = %name, "Registered query strategy factory");
        self.strategy_factories.insert(name, factory);
    }

    pub fn register_cache_factory(&mut self, name: impl Into<String>, factory: CacheFactory) {
        let name = name.into();
        debug!(plugin = %name, "Registered cache factory");
        self.cache_factories.insert(name, factory);
    }

    pub fn create_strategy(
        &self,
        name: &str,
        config: &ResolverConfig,
    ) -> Result<Arc<dyn QueryStrategy>, ResolverError> {
        let factory = self
            .strategy_factories
            .get(name)
            .ok_or_else(|| ResolverError::UnknownPlugin(name.to_string()))?;
        factory(config)
    }

    pub fn create_cache(
        &self,
        name: &str,
        config: &CacheConfig,
    ) -> Result<Arc<dyn HostCache>, ResolverError> {
        let factory = self
            .cache_factories
            .get(name)
            .ok_or_else(|| ResolverError::UnknownPlugin(name.to_string()))?;
        factory(config)
    }

    pub fn available_strategies(&self) -> Vec<String> {
        self.strategy_factories.keys().cloned().collect()
    }

    pub fn available_caches(&self) -> Vec<String> {
        self.cache_factories.keys().cloned().collect()
    }

    /// Drop every registered factory. Called on resolver shutdown.
    pub fn clear(&mut self) {
        if !self.strategy_factories.is_empty() || !self.cache_factories.is_empty() {
            info!(
                strategies = self.strategy_factories.len(),
                caches = self.cache_factories.len(),
                "Clearing plugin registry"
            );
        }
        self.strategy_factories.clear();
        self.cache_factories.clear();
    }
}

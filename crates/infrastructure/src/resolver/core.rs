use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use dashmap::DashMap;
use hostwatch_application::ports::{HostCache, QueryStrategy};
use hostwatch_application::registry::PluginRegistry;
use hostwatch_domain::{
    hostname, AddressChangeEvent, ResolveResult, ResolveStatus, ResolverConfig, ResolverError,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::TtlLruCache;
use crate::config_store::ConfigStore;
use crate::events::EventBus;
use crate::metrics::{MetricsEngine, MetricsReporter};
use crate::strategy::RecursiveQueryStrategy;
use crate::sync::lock;

pub(super) const BUILTIN_STRATEGY: &str = "recursive";
pub(super) const BUILTIN_CACHE: &str = "ttl_lru";

struct QueryContext {
    hostname: String,
    started_at: Instant,
    retry_count: u32,
}

/// Removes the owning context on every exit path of a resolution.
struct ContextGuard<'a> {
    contexts: &'a DashMap<u64, QueryContext>,
    id: u64,
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.contexts.remove(&self.id);
    }
}

/// Resolution orchestrator: admission control, cache probe, dispatch to the
/// active query strategy, retry with exponential backoff, address-change
/// detection, and shutdown.
///
/// The orchestrator owns all per-resolution contexts, keyed by id; the
/// strategy only ever sees the hostname for a single attempt. Each shared
/// component guards its own state and no lock is held across a call into
/// another component.
pub struct Resolver {
    config: Arc<ConfigStore>,
    metrics: Arc<MetricsEngine>,
    events: Arc<EventBus>,
    registry: Mutex<PluginRegistry>,
    strategy_name: String,
    cache_name: String,
    strategy: Mutex<Option<Arc<dyn QueryStrategy>>>,
    cache: Mutex<Option<Arc<dyn HostCache>>>,
    contexts: DashMap<u64, QueryContext>,
    next_context_id: AtomicU64,
    initialized: AtomicBool,
    shutdown_token: Mutex<CancellationToken>,
}

impl Resolver {
    pub fn builder(config: Arc<ConfigStore>) -> super::ResolverBuilder {
        super::ResolverBuilder::new(config)
    }

    pub(super) fn from_parts(
        config: Arc<ConfigStore>,
        metrics: Arc<MetricsEngine>,
        events: Arc<EventBus>,
        registry: PluginRegistry,
        strategy_name: String,
        cache_name: String,
    ) -> Self {
        Self {
            config,
            metrics,
            events,
            registry: Mutex::new(registry),
            strategy_name,
            cache_name,
            strategy: Mutex::new(None),
            cache: Mutex::new(None),
            contexts: DashMap::new(),
            next_context_id: AtomicU64::new(0),
            initialized: AtomicBool::new(false),
            shutdown_token: Mutex::new(CancellationToken::new()),
        }
    }

    /// Validate the configuration, install the built-in plugins, create the
    /// active strategy and cache, and register the config-change handler.
    /// Calling it a second time is a no-op.
    pub fn initialize(&self) -> Result<(), ResolverError> {
        if self.initialized.swap(true, AtomicOrdering::SeqCst) {
            warn!("Resolver already initialized");
            return Ok(());
        }

        if let Err(e) = self.try_initialize() {
            self.initialized.store(false, AtomicOrdering::SeqCst);
            error!(error = %e, "Resolver initialization failed");
            return Err(e);
        }

        info!("Resolver initialized");
        Ok(())
    }

    fn try_initialize(&self) -> Result<(), ResolverError> {
        let config = self.config.get();
        config.validate()?;

        *lock(&self.shutdown_token) = CancellationToken::new();

        let (strategy, cache) = {
            let mut registry = lock(&self.registry);
            registry.register_strategy_factory(
                BUILTIN_STRATEGY,
                Box::new(|config: &ResolverConfig| {
                    let strategy = RecursiveQueryStrategy::new(config)?;
                    Ok(Arc::new(strategy) as Arc<dyn QueryStrategy>)
                }),
            );
            registry.register_cache_factory(
                BUILTIN_CACHE,
                Box::new(|cache_config| {
                    Ok(Arc::new(TtlLruCache::from_config(cache_config)) as Arc<dyn HostCache>)
                }),
            );

            (
                registry.create_strategy(&self.strategy_name, &config)?,
                registry.create_cache(&self.cache_name, &config.cache)?,
            )
        };
        *lock(&self.strategy) = Some(strategy);
        *lock(&self.cache) = Some(cache);

        self.config
            .register_change_handler(Arc::new(|new: &ResolverConfig| {
                // The store has already validated and swapped the snapshot;
                // subsequent resolutions pick it up at admission.
                info!(servers = new.servers.len(), "Configuration updated");
            }));

        if config.metrics.enabled && !config.metrics.file.is_empty() {
            if tokio::runtime::Handle::try_current().is_ok() {
                let reporter = MetricsReporter::new(
                    Arc::clone(&self.metrics),
                    config.metrics.file.clone(),
                    config.metrics.report_interval_sec,
                )
                .with_cancellation(lock(&self.shutdown_token).clone());
                Arc::new(reporter).start();
            } else {
                warn!("Metrics report file configured but no async runtime is active");
            }
        }

        Ok(())
    }

    /// Resolve a hostname, completing exactly once per call.
    ///
    /// Early rejections (`NotInitialized`, `BadName`, `Busy`) complete on
    /// the caller's path without dispatching or touching query metrics.
    pub async fn resolve(&self, raw_hostname: &str) -> ResolveResult {
        let started = Instant::now();

        if !self.initialized.load(AtomicOrdering::SeqCst) {
            return ResolveResult::failure(ResolveStatus::NotInitialized, raw_hostname, 0);
        }
        if !hostname::is_valid_hostname(raw_hostname) {
            debug!(hostname = %raw_hostname, "Rejected invalid hostname");
            return ResolveResult::failure(ResolveStatus::BadName, raw_hostname, 0);
        }
        let hostname = hostname::normalize(raw_hostname);

        let config = self.config.get();
        if self.contexts.len() >= config.global.max_concurrent_queries as usize {
            debug!(hostname = %hostname, "Concurrent query ceiling reached");
            return ResolveResult::failure(ResolveStatus::Busy, hostname, 0);
        }

        self.events.publish_query_started(&hostname);

        let (Some(cache), Some(strategy)) = (self.active_cache(), self.active_strategy()) else {
            return ResolveResult::failure(ResolveStatus::NotInitialized, hostname, 0);
        };

        let mut old_addresses = None;
        if config.cache.enabled {
            // Observed before the probe, which would evict an expired entry
            // and lose the previous addresses for change detection.
            old_addresses = cache.peek(&hostname);

            if let Some(addresses) = cache.get(&hostname) {
                self.metrics.record_cache_hit(&hostname);
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let result = ResolveResult::cached(hostname.as_str(), addresses, elapsed_ms);
                self.events
                    .publish_query_completed(&hostname, &result.addresses, true);
                return result;
            }
            self.metrics.record_cache_miss(&hostname);
        }

        let id = self.next_context_id.fetch_add(1, AtomicOrdering::Relaxed);
        self.contexts.insert(
            id,
            QueryContext {
                hostname: hostname.clone(),
                started_at: started,
                retry_count: 0,
            },
        );
        let _guard = ContextGuard {
            contexts: &self.contexts,
            id,
        };

        let shutdown = lock(&self.shutdown_token).clone();
        let mut retry_count = 0u32;

        let result = loop {
            let attempt = tokio::select! {
                _ = shutdown.cancelled() => ResolveResult::failure(
                    ResolveStatus::Cancelled,
                    hostname.clone(),
                    started.elapsed().as_millis() as u64,
                ),
                attempt = strategy.query(&hostname) => attempt,
            };

            self.metrics
                .record_query(&hostname, attempt.resolution_time_ms, attempt.is_success());
            if !attempt.is_success() {
                let detail = attempt.error.as_deref().unwrap_or(attempt.status.as_str());
                self.metrics.record_error("resolution_failure", detail);
            }

            if attempt.is_success() && !attempt.addresses.is_empty() {
                if config.cache.enabled {
                    cache.put(&hostname, &attempt.addresses);

                    let old = old_addresses.take().unwrap_or_default();
                    if old != attempt.addresses {
                        self.publish_address_change(
                            &hostname,
                            old,
                            attempt.addresses.clone(),
                            &config,
                        );
                    }
                }
                break attempt;
            }

            if attempt.status.is_retryable() && retry_count < config.retry.max_attempts {
                let delay = config.retry.backoff_delay_ms(retry_count);
                retry_count += 1;
                if let Some(mut context) = self.contexts.get_mut(&id) {
                    context.retry_count = retry_count;
                }
                self.metrics.record_retry(&hostname, retry_count);
                debug!(
                    hostname = %hostname,
                    retry = retry_count,
                    delay_ms = delay,
                    "Scheduling retry after backoff"
                );

                tokio::select! {
                    _ = shutdown.cancelled() => break ResolveResult::failure(
                        ResolveStatus::Cancelled,
                        hostname.clone(),
                        started.elapsed().as_millis() as u64,
                    ),
                    _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
                }
                continue;
            }

            break attempt;
        };

        self.events
            .publish_query_completed(&hostname, &result.addresses, result.is_success());
        result
    }

    /// Forward to the active strategy's event pump. The built-in recursive
    /// strategy is runtime-driven and has nothing to do here.
    pub fn process_events(&self) {
        if !self.initialized.load(AtomicOrdering::SeqCst) {
            return;
        }
        if let Some(strategy) = self.active_strategy() {
            strategy.process_events();
        }
    }

    /// Stop accepting resolutions, cancel everything in flight, shut the
    /// strategy down, and tear down the plugin registry. Idempotent.
    pub async fn shutdown(&self) {
        if !self.initialized.swap(false, AtomicOrdering::SeqCst) {
            warn!("Resolver already shut down");
            return;
        }

        info!("Shutting down resolver");
        for entry in self.contexts.iter() {
            let context = entry.value();
            debug!(
                hostname = %context.hostname,
                elapsed_ms = context.started_at.elapsed().as_millis() as u64,
                retries = context.retry_count,
                "Resolution cancelled by shutdown"
            );
        }
        lock(&self.shutdown_token).cancel();

        let strategy = lock(&self.strategy).take();
        if let Some(strategy) = strategy {
            strategy.shutdown().await;
        }

        lock(&self.registry).clear();
        self.config.clear_change_handler();
        info!("Resolver shutdown complete");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(AtomicOrdering::SeqCst)
    }

    pub fn active_queries(&self) -> usize {
        self.contexts.len()
    }

    pub fn cache(&self) -> Option<Arc<dyn HostCache>> {
        self.active_cache()
    }

    pub fn metrics(&self) -> Arc<MetricsEngine> {
        Arc::clone(&self.metrics)
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    pub fn config(&self) -> ResolverConfig {
        self.config.get()
    }

    pub fn update_config(&self, new: ResolverConfig) -> Result<(), ResolverError> {
        self.config.update(new)?;
        Ok(())
    }

    /// Register an embedder-provided strategy factory; select it with the
    /// builder's strategy name before `initialize`.
    pub fn register_strategy_factory(
        &self,
        name: impl Into<String>,
        factory: hostwatch_application::registry::StrategyFactory,
    ) {
        lock(&self.registry).register_strategy_factory(name, factory);
    }

    pub fn register_cache_factory(
        &self,
        name: impl Into<String>,
        factory: hostwatch_application::registry::CacheFactory,
    ) {
        lock(&self.registry).register_cache_factory(name, factory);
    }

    fn active_strategy(&self) -> Option<Arc<dyn QueryStrategy>> {
        lock(&self.strategy).clone()
    }

    fn active_cache(&self) -> Option<Arc<dyn HostCache>> {
        lock(&self.cache).clone()
    }

    fn publish_address_change(
        &self,
        hostname: &str,
        old_addresses: Vec<IpAddr>,
        new_addresses: Vec<IpAddr>,
        config: &ResolverConfig,
    ) {
        let record_type = if new_addresses.iter().any(|address| address.is_ipv6()) {
            "AAAA"
        } else {
            "A"
        };
        info!(
            hostname = %hostname,
            old = ?old_addresses,
            new = ?new_addresses,
            "Host address set changed"
        );

        let event = AddressChangeEvent {
            hostname: hostname.to_string(),
            old_addresses,
            new_addresses,
            timestamp: SystemTime::now(),
            ttl_ms: config.cache.ttl_ms,
            record_type: record_type.to_string(),
            source: "dns_resolver".to_string(),
            is_authoritative: false,
        };
        self.events.publish_address_changed(&event);
    }
}

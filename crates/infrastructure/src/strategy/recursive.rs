use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use hickory_resolver::config::{
    LookupIpStrategy, NameServerConfigGroup, ResolverConfig as UpstreamResolverConfig, ResolverOpts,
};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::TokioAsyncResolver;
use hostwatch_application::ports::QueryStrategy;
use hostwatch_domain::{ResolveResult, ResolveStatus, ResolverConfig, ResolverError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::selection::ServerSelector;

struct ActiveQuery {
    hostname: String,
}

/// Recursive resolution against the dynamically ranked upstream pool.
///
/// One `TokioAsyncResolver` is built per configured upstream so that every
/// dispatch targets exactly the server the selector picked; hickory's own
/// cache is disabled because the service cache is authoritative. The
/// per-attempt timeout and internal try count come from the config snapshot
/// the strategy was built with.
pub struct RecursiveQueryStrategy {
    selector: Arc<ServerSelector>,
    resolvers: HashMap<String, TokioAsyncResolver>,
    active: DashMap<u64, ActiveQuery>,
    next_query_id: AtomicU64,
    initialized: AtomicBool,
    shutdown_token: CancellationToken,
}

impl RecursiveQueryStrategy {
    pub fn new(config: &ResolverConfig) -> Result<Self, ResolverError> {
        let selector = Arc::new(ServerSelector::from_config(config));

        let mut resolvers = HashMap::new();
        for server in &config.servers {
            let ip: IpAddr = server
                .address
                .parse()
                .map_err(|_| ResolverError::InvalidServerAddress(server.address.clone()))?;

            let nameservers = NameServerConfigGroup::from_ips_clear(&[ip], server.port, true);
            let upstream = UpstreamResolverConfig::from_parts(None, Vec::new(), nameservers);

            let mut opts = ResolverOpts::default();
            opts.timeout = Duration::from_millis(u64::from(config.global.query_timeout_ms));
            opts.attempts = config.retry.max_attempts as usize;
            opts.ip_strategy = if config.global.ipv6_enabled {
                LookupIpStrategy::Ipv4AndIpv6
            } else {
                LookupIpStrategy::Ipv4Only
            };
            opts.cache_size = 0;
            opts.use_hosts_file = false;

            resolvers.insert(
                server.address.clone(),
                TokioAsyncResolver::tokio(upstream, opts),
            );
        }

        info!(
            servers = resolvers.len(),
            ipv6 = config.global.ipv6_enabled,
            timeout_ms = config.global.query_timeout_ms,
            "Recursive query strategy initialized"
        );

        Ok(Self {
            selector,
            resolvers,
            active: DashMap::new(),
            next_query_id: AtomicU64::new(0),
            initialized: AtomicBool::new(true),
            shutdown_token: CancellationToken::new(),
        })
    }

    pub fn selector(&self) -> &ServerSelector {
        &self.selector
    }

    fn map_error(hostname: &str, elapsed_ms: u64, error: &ResolveError) -> ResolveResult {
        let status = match error.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. } => match response_code {
                ResponseCode::NXDomain => ResolveStatus::NotFound,
                ResponseCode::ServFail => ResolveStatus::ServerFail,
                _ => ResolveStatus::NoData,
            },
            ResolveErrorKind::Timeout => ResolveStatus::Timeout,
            _ => ResolveStatus::ServerFail,
        };
        ResolveResult::failure_with_detail(status, hostname, elapsed_ms, error.to_string())
    }
}

#[async_trait]
impl QueryStrategy for RecursiveQueryStrategy {
    async fn query(&self, hostname: &str) -> ResolveResult {
        if !self.initialized.load(AtomicOrdering::Acquire) {
            return ResolveResult::failure(ResolveStatus::NotInitialized, hostname, 0);
        }

        let Some(server) = self.selector.select() else {
            return ResolveResult::failure(ResolveStatus::ServerFail, hostname, 0);
        };
        let Some(resolver) = self.resolvers.get(&server) else {
            return ResolveResult::failure(ResolveStatus::ServerFail, hostname, 0);
        };

        let id = self.next_query_id.fetch_add(1, AtomicOrdering::Relaxed);
        self.active.insert(
            id,
            ActiveQuery {
                hostname: hostname.to_string(),
            },
        );
        let started = Instant::now();

        let outcome = tokio::select! {
            _ = self.shutdown_token.cancelled() => None,
            result = resolver.lookup_ip(hostname) => Some(result),
        };

        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;
        self.active.remove(&id);

        match outcome {
            None => ResolveResult::failure(ResolveStatus::Cancelled, hostname, elapsed_ms),
            Some(Ok(lookup)) => {
                let addresses: Vec<IpAddr> = lookup.iter().collect();
                self.selector.on_success(&server, elapsed);
                if addresses.is_empty() {
                    ResolveResult::failure(ResolveStatus::NoData, hostname, elapsed_ms)
                } else {
                    debug!(
                        hostname = %hostname,
                        server = %server,
                        addresses = addresses.len(),
                        latency_ms = elapsed_ms,
                        "Upstream query answered"
                    );
                    ResolveResult::success(hostname, addresses, elapsed_ms)
                }
            }
            Some(Err(e)) => {
                self.selector.on_failure(&server);
                debug!(
                    hostname = %hostname,
                    server = %server,
                    error = %e,
                    "Upstream query failed"
                );
                Self::map_error(hostname, elapsed_ms, &e)
            }
        }
    }

    async fn shutdown(&self) {
        if !self.initialized.swap(false, AtomicOrdering::AcqRel) {
            return;
        }

        self.shutdown_token.cancel();
        let pending = self.active.len();
        if pending > 0 {
            info!(pending, "Cancelling in-flight upstream queries");
            for entry in self.active.iter() {
                debug!(hostname = %entry.value().hostname, "Cancelled in-flight query");
            }
        }
        self.active.clear();
        info!("Recursive query strategy shut down");
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(AtomicOrdering::Acquire)
    }
}

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use hostwatch_domain::{ResolverConfig, ServerConfig};
use tracing::{debug, warn};

use super::health::ServerHealth;
use crate::sync::lock;

/// Latency-weighted upstream selection over the configured server set.
///
/// Only enabled, healthy servers participate; each is scored
/// `weight / (1 + avg_latency_ms)` and the highest score wins, with ties
/// going to the first-configured server. When every server is unhealthy the
/// selector resets the whole health map and returns the first configured
/// server, so an outage never requires manual intervention to recover.
pub struct ServerSelector {
    servers: Vec<ServerConfig>,
    error_threshold: u32,
    health: Mutex<HashMap<String, ServerHealth>>,
}

impl ServerSelector {
    pub fn new(servers: Vec<ServerConfig>, error_threshold: u32) -> Self {
        let health = servers
            .iter()
            .filter(|server| server.enabled)
            .map(|server| (server.address.clone(), ServerHealth::default()))
            .collect();
        Self {
            servers,
            error_threshold,
            health: Mutex::new(health),
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(
            config.servers.clone(),
            config.global.server_error_threshold,
        )
    }

    /// Pick the upstream for the next query. `None` only when no server is
    /// configured at all.
    pub fn select(&self) -> Option<String> {
        if self.servers.is_empty() {
            return None;
        }

        let mut health = lock(&self.health);

        let mut best: Option<(&str, f64)> = None;
        for server in &self.servers {
            if !server.enabled {
                continue;
            }
            let Some(state) = health.get(&server.address) else {
                continue;
            };
            if !state.healthy {
                continue;
            }
            let score = f64::from(server.weight) / (1.0 + state.avg_latency_ms());
            // Strictly-greater comparison keeps the first-configured server
            // on equal scores.
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((server.address.as_str(), score));
            }
        }

        if let Some((address, score)) = best {
            debug!(server = %address, score, "Selected upstream server");
            return Some(address.to_string());
        }

        warn!("No healthy upstream server available, resetting health map");
        for state in health.values_mut() {
            state.reset();
        }
        Some(self.servers[0].address.clone())
    }

    pub fn on_success(&self, server: &str, latency: Duration) {
        let mut health = lock(&self.health);
        health
            .entry(server.to_string())
            .or_default()
            .record_success(latency);
    }

    pub fn on_failure(&self, server: &str) {
        let mut health = lock(&self.health);
        let state = health.entry(server.to_string()).or_default();
        if state.record_failure(self.error_threshold) {
            warn!(
                server = %server,
                errors = state.error_count,
                "Upstream server marked unhealthy"
            );
        }
    }

    pub fn health(&self, server: &str) -> Option<ServerHealth> {
        lock(&self.health).get(server).cloned()
    }
}

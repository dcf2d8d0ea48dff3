use std::collections::{HashMap, VecDeque};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, info, warn};

use super::running_stats::RunningStats;
use crate::sync::lock;

const MAX_SAMPLES: usize = 1000;
const MAX_RETRY_HISTORY: usize = 100;
const PERFORMANCE_UPDATE_INTERVAL: Duration = Duration::from_secs(60);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Per-hostname aggregates.
#[derive(Debug, Clone, Default)]
pub struct HostStats {
    pub query_count: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub retry_count: u64,
    pub last_query_time: Option<SystemTime>,
    pub last_cache_hit_time: Option<SystemTime>,
    pub last_cache_miss_time: Option<SystemTime>,
    pub last_retry_time: Option<SystemTime>,
    pub running_stats: RunningStats,
}

/// Per-upstream latency aggregates over a bounded sample ring.
#[derive(Debug, Clone)]
pub struct ServerStats {
    pub avg_latency_ms: f64,
    pub last_update: SystemTime,
    samples: VecDeque<f64>,
}

impl ServerStats {
    fn new() -> Self {
        Self {
            avg_latency_ms: 0.0,
            last_update: SystemTime::now(),
            samples: VecDeque::new(),
        }
    }

    fn record(&mut self, latency_ms: f64) {
        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(latency_ms);
        self.avg_latency_ms = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        self.last_update = SystemTime::now();
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

#[derive(Debug, Clone)]
pub struct ErrorStats {
    pub count: u64,
    pub last_occurrence: SystemTime,
    pub last_detail: String,
}

/// Derived rates, recomputed at most once per `PERFORMANCE_UPDATE_INTERVAL`.
#[derive(Debug, Clone)]
pub struct PerformanceSnapshot {
    pub queries_per_second: f64,
    pub cache_hit_rate: f64,
    pub avg_response_time_ms: f64,
    pub error_rate: f64,
    pub measured_at: SystemTime,
}

impl Default for PerformanceSnapshot {
    fn default() -> Self {
        Self {
            queries_per_second: 0.0,
            cache_hit_rate: 0.0,
            avg_response_time_ms: 0.0,
            error_rate: 0.0,
            measured_at: SystemTime::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlertThresholds {
    pub max_error_rate: f64,
    pub min_cache_hit_rate: f64,
    /// Exceeding per-query thresholds is warned at ingestion time and does
    /// not appear in `alerts()`.
    pub max_latency: Duration,
    pub max_retry_count: u32,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            max_error_rate: 0.1,
            min_cache_hit_rate: 0.5,
            max_latency: Duration::from_millis(1000),
            max_retry_count: 3,
        }
    }
}

/// Clone-out snapshot of everything the engine tracks.
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_retries: u64,
    pub cache_hit_rate: f64,
    pub avg_query_time_ms: f64,
    pub query_time_stddev_ms: f64,
    pub min_query_time_ms: f64,
    pub max_query_time_ms: f64,
    pub server_latencies: HashMap<String, f64>,
    pub hostname_stats: HashMap<String, HostStats>,
    pub error_stats: HashMap<String, ErrorStats>,
    pub retry_attempts: HashMap<String, Vec<u32>>,
}

struct MetricsInner {
    query_stats: RunningStats,
    query_durations: VecDeque<f64>,
    hostname_stats: HashMap<String, HostStats>,
    server_stats: HashMap<String, ServerStats>,
    error_stats: HashMap<String, ErrorStats>,
    retry_attempts: HashMap<String, Vec<u32>>,
    thresholds: AlertThresholds,
    performance: PerformanceSnapshot,
    last_performance_update: Instant,
    last_cleanup: Instant,
}

impl MetricsInner {
    fn new() -> Self {
        Self {
            query_stats: RunningStats::new(),
            query_durations: VecDeque::with_capacity(MAX_SAMPLES),
            hostname_stats: HashMap::new(),
            server_stats: HashMap::new(),
            error_stats: HashMap::new(),
            retry_attempts: HashMap::new(),
            thresholds: AlertThresholds::default(),
            performance: PerformanceSnapshot::default(),
            last_performance_update: Instant::now(),
            last_cleanup: Instant::now(),
        }
    }
}

/// Running metrics over queries, cache traffic, upstream latencies, retries
/// and errors.
///
/// The monotonic counters are atomics and linearisable on their own; the
/// maps and derived snapshots share one mutex and are updated inside a
/// single non-suspending critical section per record call.
pub struct MetricsEngine {
    total_queries: AtomicU64,
    successful_queries: AtomicU64,
    failed_queries: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    total_retries: AtomicU64,
    inner: Mutex<MetricsInner>,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsEngine {
    pub fn new() -> Self {
        Self {
            total_queries: AtomicU64::new(0),
            successful_queries: AtomicU64::new(0),
            failed_queries: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            total_retries: AtomicU64::new(0),
            inner: Mutex::new(MetricsInner::new()),
        }
    }

    pub fn record_query(&self, hostname: &str, duration_ms: u64, success: bool) {
        self.total_queries.fetch_add(1, AtomicOrdering::Relaxed);
        if success {
            self.successful_queries.fetch_add(1, AtomicOrdering::Relaxed);
        } else {
            self.failed_queries.fetch_add(1, AtomicOrdering::Relaxed);
        }

        let duration = duration_ms as f64;
        let mut inner = lock(&self.inner);
        inner.query_stats.update(duration);

        let host = inner.hostname_stats.entry(hostname.to_string()).or_default();
        host.query_count += 1;
        host.last_query_time = Some(SystemTime::now());
        host.running_stats.update(duration);

        if inner.query_durations.len() == MAX_SAMPLES {
            inner.query_durations.pop_front();
        }
        inner.query_durations.push_back(duration);

        self.cleanup_old_stats(&mut inner);
        self.update_performance(&mut inner);

        debug!(hostname = %hostname, duration_ms, success, "Recorded query");
    }

    pub fn record_cache_hit(&self, hostname: &str) {
        self.cache_hits.fetch_add(1, AtomicOrdering::Relaxed);

        let mut inner = lock(&self.inner);
        let host = inner.hostname_stats.entry(hostname.to_string()).or_default();
        host.cache_hits += 1;
        host.last_cache_hit_time = Some(SystemTime::now());
        self.update_performance(&mut inner);
    }

    pub fn record_cache_miss(&self, hostname: &str) {
        self.cache_misses.fetch_add(1, AtomicOrdering::Relaxed);

        let mut inner = lock(&self.inner);
        let host = inner.hostname_stats.entry(hostname.to_string()).or_default();
        host.cache_misses += 1;
        host.last_cache_miss_time = Some(SystemTime::now());
        self.update_performance(&mut inner);
    }

    pub fn record_server_latency(&self, server: &str, latency: Duration) {
        let latency_ms = latency.as_secs_f64() * 1000.0;
        let mut inner = lock(&self.inner);
        inner
            .server_stats
            .entry(server.to_string())
            .or_insert_with(ServerStats::new)
            .record(latency_ms);

        if latency > inner.thresholds.max_latency {
            warn!(
                server = %server,
                latency_ms = latency_ms as u64,
                threshold_ms = inner.thresholds.max_latency.as_millis() as u64,
                "Server latency exceeded threshold"
            );
        }
    }

    pub fn record_error(&self, kind: &str, detail: &str) {
        let mut inner = lock(&self.inner);
        let stats = inner
            .error_stats
            .entry(kind.to_string())
            .or_insert_with(|| ErrorStats {
                count: 0,
                last_occurrence: SystemTime::now(),
                last_detail: String::new(),
            });
        stats.count += 1;
        stats.last_occurrence = SystemTime::now();
        stats.last_detail = detail.to_string();
        self.update_performance(&mut inner);

        if inner.performance.error_rate > inner.thresholds.max_error_rate {
            warn!(
                error_rate = inner.performance.error_rate,
                threshold = inner.thresholds.max_error_rate,
                "Error rate exceeded threshold"
            );
        }
    }

    pub fn record_retry(&self, hostname: &str, attempt: u32) {
        self.total_retries.fetch_add(1, AtomicOrdering::Relaxed);

        let mut inner = lock(&self.inner);
        let host = inner.hostname_stats.entry(hostname.to_string()).or_default();
        host.retry_count += 1;
        host.last_retry_time = Some(SystemTime::now());

        let attempts = inner.retry_attempts.entry(hostname.to_string()).or_default();
        attempts.push(attempt);
        if attempts.len() > MAX_RETRY_HISTORY {
            let excess = attempts.len() - MAX_RETRY_HISTORY;
            attempts.drain(..excess);
        }

        if attempt > inner.thresholds.max_retry_count {
            warn!(hostname = %hostname, attempt, "Retry count exceeded threshold");
        }
    }

    pub fn stats(&self) -> MetricsSummary {
        let inner = lock(&self.inner);

        let cache_hits = self.cache_hits.load(AtomicOrdering::Relaxed);
        let cache_misses = self.cache_misses.load(AtomicOrdering::Relaxed);
        let lookups = cache_hits + cache_misses;

        MetricsSummary {
            total_queries: self.total_queries.load(AtomicOrdering::Relaxed),
            successful_queries: self.successful_queries.load(AtomicOrdering::Relaxed),
            failed_queries: self.failed_queries.load(AtomicOrdering::Relaxed),
            cache_hits,
            cache_misses,
            total_retries: self.total_retries.load(AtomicOrdering::Relaxed),
            cache_hit_rate: if lookups > 0 {
                cache_hits as f64 / lookups as f64
            } else {
                0.0
            },
            avg_query_time_ms: inner.query_stats.mean(),
            query_time_stddev_ms: inner.query_stats.stddev(),
            min_query_time_ms: inner.query_stats.min(),
            max_query_time_ms: inner.query_stats.max(),
            server_latencies: inner
                .server_stats
                .iter()
                .map(|(server, stats)| (server.clone(), stats.avg_latency_ms))
                .collect(),
            hostname_stats: inner.hostname_stats.clone(),
            error_stats: inner.error_stats.clone(),
            retry_attempts: inner.retry_attempts.clone(),
        }
    }

    pub fn reset(&self) {
        self.total_queries.store(0, AtomicOrdering::Relaxed);
        self.successful_queries.store(0, AtomicOrdering::Relaxed);
        self.failed_queries.store(0, AtomicOrdering::Relaxed);
        self.cache_hits.store(0, AtomicOrdering::Relaxed);
        self.cache_misses.store(0, AtomicOrdering::Relaxed);
        self.total_retries.store(0, AtomicOrdering::Relaxed);

        let mut inner = lock(&self.inner);
        let thresholds = inner.thresholds.clone();
        *inner = MetricsInner::new();
        inner.thresholds = thresholds;
        info!("All metrics reset");
    }

    pub fn set_alert_thresholds(&self, thresholds: AlertThresholds) {
        let mut inner = lock(&self.inner);
        inner.thresholds = thresholds;
        info!("Alert thresholds updated");
    }

    /// Human-readable alert lines for the rate thresholds currently
    /// breached. Per-query thresholds (latency, retries) only warn at
    /// ingestion time and never appear here.
    pub fn alerts(&self) -> Vec<String> {
        let inner = lock(&self.inner);
        let mut alerts = Vec::new();

        if inner.performance.error_rate > inner.thresholds.max_error_rate {
            alerts.push(format!(
                "Error rate {:.2}% exceeded threshold {:.2}%",
                inner.performance.error_rate * 100.0,
                inner.thresholds.max_error_rate * 100.0
            ));
        }
        if inner.performance.cache_hit_rate < inner.thresholds.min_cache_hit_rate {
            alerts.push(format!(
                "Cache hit rate {:.2}% below threshold {:.2}%",
                inner.performance.cache_hit_rate * 100.0,
                inner.thresholds.min_cache_hit_rate * 100.0
            ));
        }

        alerts
    }

    pub fn performance(&self) -> PerformanceSnapshot {
        let mut inner = lock(&self.inner);
        self.update_performance(&mut inner);
        inner.performance.clone()
    }

    /// Prometheus text export: the monotonic counters, a summary of recent
    /// query durations, per-server latency gauges, and per-kind error
    /// counters.
    pub fn prometheus(&self) -> String {
        let inner = lock(&self.inner);
        let mut out = String::new();

        let _ = writeln!(out, "# TYPE dns_total_queries counter");
        let _ = writeln!(
            out,
            "dns_total_queries {}",
            self.total_queries.load(AtomicOrdering::Relaxed)
        );
        let _ = writeln!(out, "# TYPE dns_successful_queries counter");
        let _ = writeln!(
            out,
            "dns_successful_queries {}",
            self.successful_queries.load(AtomicOrdering::Relaxed)
        );
        let _ = writeln!(out, "# TYPE dns_failed_queries counter");
        let _ = writeln!(
            out,
            "dns_failed_queries {}",
            self.failed_queries.load(AtomicOrdering::Relaxed)
        );
        let _ = writeln!(out, "# TYPE dns_cache_hits counter");
        let _ = writeln!(
            out,
            "dns_cache_hits {}",
            self.cache_hits.load(AtomicOrdering::Relaxed)
        );
        let _ = writeln!(out, "# TYPE dns_cache_misses counter");
        let _ = writeln!(
            out,
            "dns_cache_misses {}",
            self.cache_misses.load(AtomicOrdering::Relaxed)
        );
        let _ = writeln!(out, "# TYPE dns_total_retries counter");
        let _ = writeln!(
            out,
            "dns_total_retries {}",
            self.total_retries.load(AtomicOrdering::Relaxed)
        );

        let _ = writeln!(out, "# TYPE dns_query_time_ms summary");
        if !inner.query_durations.is_empty() {
            let mut sorted: Vec<f64> = inner.query_durations.iter().copied().collect();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            for (quantile, label) in [(0.5, "0.50"), (0.9, "0.90"), (0.99, "0.99")] {
                let index = (quantile * (sorted.len() - 1) as f64) as usize;
                let _ = writeln!(
                    out,
                    "dns_query_time_ms{{quantile=\"{}\"}} {}",
                    label, sorted[index]
                );
            }
            let _ = writeln!(out, "dns_query_time_ms_count {}", sorted.len());
        }

        let _ = writeln!(out, "# TYPE dns_server_latency_ms gauge");
        for (server, stats) in &inner.server_stats {
            let _ = writeln!(
                out,
                "dns_server_latency_ms{{server=\"{}\",type=\"avg\"}} {}",
                server, stats.avg_latency_ms
            );
        }

        let _ = writeln!(out, "# TYPE dns_errors counter");
        for (kind, stats) in &inner.error_stats {
            let _ = writeln!(out, "dns_errors{{type=\"{}\"}} {}", kind, stats.count);
        }

        out
    }

    fn update_performance(&self, inner: &mut MetricsInner) {
        let now = Instant::now();
        let elapsed = now.duration_since(inner.last_performance_update);
        if elapsed < PERFORMANCE_UPDATE_INTERVAL {
            return;
        }

        let total = self.total_queries.load(AtomicOrdering::Relaxed) as f64;
        let failed = self.failed_queries.load(AtomicOrdering::Relaxed) as f64;
        let hits = self.cache_hits.load(AtomicOrdering::Relaxed) as f64;
        let misses = self.cache_misses.load(AtomicOrdering::Relaxed) as f64;
        let lookups = hits + misses;

        inner.performance = PerformanceSnapshot {
            queries_per_second: total / elapsed.as_secs_f64(),
            cache_hit_rate: if lookups > 0.0 { hits / lookups } else { 0.0 },
            avg_response_time_ms: inner.query_stats.mean(),
            error_rate: failed / total.max(1.0),
            measured_at: SystemTime::now(),
        };
        inner.last_performance_update = now;
    }

    fn cleanup_old_stats(&self, inner: &mut MetricsInner) {
        let now = Instant::now();
        if now.duration_since(inner.last_cleanup) < CLEANUP_INTERVAL {
            return;
        }
        let sys_now = SystemTime::now();
        let expired = |time: Option<SystemTime>| {
            time.map_or(true, |t| {
                sys_now
                    .duration_since(t)
                    .map_or(false, |age| age > CLEANUP_INTERVAL)
            })
        };

        inner
            .hostname_stats
            .retain(|_, stats| !expired(stats.last_query_time));

        // Retry history follows its host entry out.
        let MetricsInner {
            ref hostname_stats,
            ref mut retry_attempts,
            ..
        } = *inner;
        retry_attempts.retain(|hostname, _| hostname_stats.contains_key(hostname));

        inner
            .server_stats
            .retain(|_, stats| !expired(Some(stats.last_update)));

        inner.last_cleanup = now;
        debug!(
            hosts = inner.hostname_stats.len(),
            servers = inner.server_stats.len(),
            "Dropped stale metrics entries"
        );
    }
}

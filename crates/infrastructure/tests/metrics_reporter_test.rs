mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{addrs, scripted_resolver, test_config, ScriptedOutcome, ScriptedStrategy};
use hostwatch_infrastructure::{MetricsEngine, MetricsReporter};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_reporter_writes_prometheus_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrics.prom");

    let metrics = Arc::new(MetricsEngine::new());
    metrics.record_cache_miss("a.test");
    metrics.record_query("a.test", 12, true);

    let token = CancellationToken::new();
    let handle = Arc::new(
        MetricsReporter::new(Arc::clone(&metrics), &path, 1).with_cancellation(token.clone()),
    )
    .start();

    // The first interval tick fires immediately.
    tokio::time::sleep(Duration::from_millis(200)).await;
    token.cancel();
    handle.await.unwrap();

    let report = std::fs::read_to_string(&path).unwrap();
    assert!(report.contains("dns_total_queries 1"));
    assert!(report.contains("dns_cache_misses 1"));
}

#[tokio::test]
async fn test_resolver_initialize_starts_the_reporter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resolver-metrics.prom");

    let strategy = ScriptedStrategy::new(vec![ScriptedOutcome::Succeed(addrs(&["1.1.1.1"]))]);
    let mut config = test_config();
    config.metrics.file = path.to_str().unwrap().to_string();
    config.metrics.report_interval_sec = 1;
    let (resolver, _recorder) = scripted_resolver(config, strategy);

    resolver.resolve("a.test").await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let report = std::fs::read_to_string(&path).unwrap();
    assert!(report.contains("dns_total_queries"));

    resolver.shutdown().await;
}

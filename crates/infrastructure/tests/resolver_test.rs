mod helpers;

use std::sync::Arc;
use std::time::{Duration, Instant};

use helpers::{addrs, scripted_resolver, test_config, ScriptedOutcome, ScriptedStrategy};
use hostwatch_application::ports::HostCache;
use hostwatch_domain::ResolveStatus;
use hostwatch_infrastructure::{ConfigStore, Resolver};

#[tokio::test]
async fn test_second_resolution_is_served_from_cache() {
    let strategy = ScriptedStrategy::new(vec![ScriptedOutcome::Succeed(addrs(&[
        "93.184.216.34",
    ]))]);
    let mut config = test_config();
    config.cache.ttl_ms = 60_000;
    let (resolver, recorder) = scripted_resolver(config, Arc::clone(&strategy));

    let first = resolver.resolve("example.test").await;
    assert_eq!(first.status, ResolveStatus::Success);
    assert!(!first.from_cache);
    assert_eq!(first.addresses, addrs(&["93.184.216.34"]));

    let second = resolver.resolve("example.test").await;
    assert_eq!(second.status, ResolveStatus::Success);
    assert!(second.from_cache);
    assert_eq!(second.addresses, addrs(&["93.184.216.34"]));

    assert_eq!(strategy.queries(), 1);
    let stats = resolver.metrics().stats();
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_misses, 1);

    let completed = recorder.completed.lock().unwrap();
    assert_eq!(completed.len(), 2);
    assert!(completed.iter().all(|(_, _, success)| *success));
}

#[tokio::test]
async fn test_address_change_event_after_expiry() {
    let strategy = ScriptedStrategy::new(vec![ScriptedOutcome::Succeed(addrs(&["2.2.2.2"]))]);
    let mut config = test_config();
    config.cache.ttl_ms = 30;
    let (resolver, recorder) = scripted_resolver(config, Arc::clone(&strategy));

    resolver
        .cache()
        .unwrap()
        .put("x.test", &addrs(&["1.1.1.1"]));
    tokio::time::sleep(Duration::from_millis(60)).await;

    let result = resolver.resolve("x.test").await;
    assert_eq!(result.status, ResolveStatus::Success);
    assert_eq!(result.addresses, addrs(&["2.2.2.2"]));
    assert_eq!(strategy.queries(), 1);

    let changes = recorder.changes.lock().unwrap();
    assert_eq!(changes.len(), 1);
    let event = &changes[0];
    assert_eq!(event.hostname, "x.test");
    assert_eq!(event.old_addresses, addrs(&["1.1.1.1"]));
    assert_eq!(event.new_addresses, addrs(&["2.2.2.2"]));
    assert_eq!(event.record_type, "A");
    assert_eq!(event.source, "dns_resolver");
    assert_eq!(event.ttl_ms, 30);
    assert!(!event.is_authoritative);
}

#[tokio::test]
async fn test_first_resolution_publishes_change_from_empty() {
    let strategy = ScriptedStrategy::new(vec![ScriptedOutcome::Succeed(addrs(&[
        "2001:db8::1",
        "10.0.0.1",
    ]))]);
    let (resolver, recorder) = scripted_resolver(test_config(), strategy);

    resolver.resolve("fresh.test").await;

    let changes = recorder.changes.lock().unwrap();
    assert_eq!(changes.len(), 1);
    assert!(changes[0].old_addresses.is_empty());
    assert_eq!(changes[0].record_type, "AAAA");
}

#[tokio::test]
async fn test_unchanged_addresses_do_not_republish() {
    let strategy = ScriptedStrategy::new(vec![
        ScriptedOutcome::Succeed(addrs(&["5.5.5.5"])),
        ScriptedOutcome::Succeed(addrs(&["5.5.5.5"])),
    ]);
    let mut config = test_config();
    config.cache.ttl_ms = 30;
    let (resolver, recorder) = scripted_resolver(config, Arc::clone(&strategy));

    resolver.resolve("steady.test").await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    resolver.resolve("steady.test").await;

    assert_eq!(strategy.queries(), 2);
    let changes = recorder.changes.lock().unwrap();
    assert_eq!(changes.len(), 1);
    assert!(changes[0].old_addresses.is_empty());
}

#[tokio::test]
async fn test_server_fail_is_retried_with_backoff() {
    let strategy = ScriptedStrategy::new(vec![
        ScriptedOutcome::Fail(ResolveStatus::ServerFail),
        ScriptedOutcome::Fail(ResolveStatus::ServerFail),
        ScriptedOutcome::Succeed(addrs(&["3.3.3.3"])),
    ]);
    let (resolver, _recorder) = scripted_resolver(test_config(), Arc::clone(&strategy));

    let started = Instant::now();
    let result = resolver.resolve("retry.test").await;
    let elapsed = started.elapsed();

    assert_eq!(result.status, ResolveStatus::Success);
    assert_eq!(result.addresses, addrs(&["3.3.3.3"]));
    assert_eq!(strategy.queries(), 3);
    assert_eq!(resolver.metrics().stats().total_retries, 2);

    // Backoff delays of 10ms then 20ms must have elapsed.
    assert!(elapsed >= Duration::from_millis(30), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn test_timeout_is_retryable() {
    let strategy = ScriptedStrategy::new(vec![
        ScriptedOutcome::Fail(ResolveStatus::Timeout),
        ScriptedOutcome::Succeed(addrs(&["4.4.4.4"])),
    ]);
    let (resolver, _recorder) = scripted_resolver(test_config(), Arc::clone(&strategy));

    let result = resolver.resolve("slowish.test").await;
    assert_eq!(result.status, ResolveStatus::Success);
    assert_eq!(resolver.metrics().stats().total_retries, 1);
}

#[tokio::test]
async fn test_nxdomain_is_not_retried() {
    let strategy = ScriptedStrategy::new(vec![ScriptedOutcome::Fail(ResolveStatus::NotFound)]);
    let (resolver, recorder) = scripted_resolver(test_config(), Arc::clone(&strategy));

    let result = resolver.resolve("missing.test").await;
    assert_eq!(result.status, ResolveStatus::NotFound);
    assert_eq!(strategy.queries(), 1);
    assert_eq!(resolver.metrics().stats().total_retries, 0);

    let completed = recorder.completed.lock().unwrap();
    assert_eq!(completed.len(), 1);
    assert!(!completed[0].2);
}

#[tokio::test]
async fn test_no_data_is_not_retried() {
    let strategy = ScriptedStrategy::new(vec![ScriptedOutcome::Fail(ResolveStatus::NoData)]);
    let (resolver, _recorder) = scripted_resolver(test_config(), Arc::clone(&strategy));

    let result = resolver.resolve("empty.test").await;
    assert_eq!(result.status, ResolveStatus::NoData);
    assert_eq!(strategy.queries(), 1);
    assert_eq!(resolver.metrics().stats().total_retries, 0);
}

#[tokio::test]
async fn test_retries_stop_at_max_attempts() {
    let strategy = ScriptedStrategy::new(Vec::new());
    let mut config = test_config();
    config.retry.max_attempts = 2;
    let (resolver, _recorder) = scripted_resolver(config, Arc::clone(&strategy));

    let result = resolver.resolve("down.test").await;
    assert_eq!(result.status, ResolveStatus::ServerFail);
    assert_eq!(strategy.queries(), 3);
    assert_eq!(resolver.metrics().stats().total_retries, 2);
}

#[tokio::test]
async fn test_concurrent_limit_rejects_with_busy() {
    let strategy = ScriptedStrategy::new(vec![ScriptedOutcome::Hang]);
    let mut config = test_config();
    config.global.max_concurrent_queries = 1;
    let (resolver, _recorder) = scripted_resolver(config, strategy);

    let background = {
        let resolver = Arc::clone(&resolver);
        tokio::spawn(async move { resolver.resolve("slow.test").await })
    };
    while resolver.active_queries() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let second = resolver.resolve("a.test").await;
    assert_eq!(second.status, ResolveStatus::Busy);

    resolver.shutdown().await;
    let first = background.await.unwrap();
    assert_eq!(first.status, ResolveStatus::Cancelled);
    assert_eq!(resolver.active_queries(), 0);
}

#[tokio::test]
async fn test_invalid_hostname_rejected_before_dispatch() {
    let strategy = ScriptedStrategy::new(Vec::new());
    let (resolver, recorder) = scripted_resolver(test_config(), Arc::clone(&strategy));

    let result = resolver.resolve("-bad.test.").await;
    assert_eq!(result.status, ResolveStatus::BadName);

    assert_eq!(strategy.queries(), 0);
    let stats = resolver.metrics().stats();
    assert_eq!(stats.total_queries, 0);
    assert_eq!(stats.cache_misses, 0);
    assert!(recorder.started.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_hostnames_are_case_normalized() {
    let strategy = ScriptedStrategy::new(vec![ScriptedOutcome::Succeed(addrs(&["7.7.7.7"]))]);
    let (resolver, recorder) = scripted_resolver(test_config(), Arc::clone(&strategy));

    let first = resolver.resolve("Example.TEST").await;
    assert_eq!(first.hostname, "example.test");

    let second = resolver.resolve("EXAMPLE.test").await;
    assert!(second.from_cache);
    assert_eq!(strategy.queries(), 1);

    let started = recorder.started.lock().unwrap();
    assert!(started.iter().all(|hostname| hostname == "example.test"));
}

#[tokio::test]
async fn test_disabled_cache_always_dispatches() {
    let strategy = ScriptedStrategy::new(vec![
        ScriptedOutcome::Succeed(addrs(&["1.1.1.1"])),
        ScriptedOutcome::Succeed(addrs(&["2.2.2.2"])),
    ]);
    let mut config = test_config();
    config.cache.enabled = false;
    let (resolver, recorder) = scripted_resolver(config, Arc::clone(&strategy));

    let first = resolver.resolve("nocache.test").await;
    let second = resolver.resolve("nocache.test").await;
    assert!(!first.from_cache);
    assert!(!second.from_cache);
    assert_eq!(strategy.queries(), 2);

    let stats = resolver.metrics().stats();
    assert_eq!(stats.cache_hits, 0);
    assert_eq!(stats.cache_misses, 0);
    assert!(recorder.changes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_shutdown_is_idempotent_and_terminal() {
    let strategy = ScriptedStrategy::new(vec![ScriptedOutcome::Succeed(addrs(&["1.1.1.1"]))]);
    let (resolver, _recorder) = scripted_resolver(test_config(), Arc::clone(&strategy));

    resolver.resolve("a.test").await;
    resolver.shutdown().await;
    resolver.shutdown().await;
    assert_eq!(strategy.shutdown_calls(), 1);

    let rejected = resolver.resolve("a.test").await;
    assert_eq!(rejected.status, ResolveStatus::NotInitialized);
    assert!(!resolver.is_initialized());
}

#[tokio::test]
async fn test_resolve_before_initialize_is_rejected() {
    let store = Arc::new(ConfigStore::new(test_config()).unwrap());
    let resolver = Resolver::builder(store).build();

    let result = resolver.resolve("a.test").await;
    assert_eq!(result.status, ResolveStatus::NotInitialized);
}

#[tokio::test]
async fn test_unknown_strategy_fails_initialization() {
    let store = Arc::new(ConfigStore::new(test_config()).unwrap());
    let resolver = Resolver::builder(store).with_strategy("missing").build();

    assert!(resolver.initialize().is_err());
    assert!(!resolver.is_initialized());
}

#[tokio::test]
async fn test_query_metrics_follow_attempts() {
    let strategy = ScriptedStrategy::new(vec![
        ScriptedOutcome::Fail(ResolveStatus::ServerFail),
        ScriptedOutcome::Succeed(addrs(&["3.3.3.3"])),
    ]);
    let (resolver, _recorder) = scripted_resolver(test_config(), strategy);

    resolver.resolve("metrics.test").await;

    let stats = resolver.metrics().stats();
    assert_eq!(stats.total_queries, 2);
    assert_eq!(stats.successful_queries, 1);
    assert_eq!(stats.failed_queries, 1);
    assert_eq!(stats.error_stats.get("resolution_failure").unwrap().count, 1);
}

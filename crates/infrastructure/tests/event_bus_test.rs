use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use hostwatch_domain::{AddressChangeEvent, ResolverError};
use hostwatch_infrastructure::EventBus;

fn addrs(list: &[&str]) -> Vec<IpAddr> {
    list.iter().map(|ip| ip.parse().unwrap()).collect()
}

fn change_event() -> AddressChangeEvent {
    AddressChangeEvent {
        hostname: "x.test".to_string(),
        old_addresses: addrs(&["1.1.1.1"]),
        new_addresses: addrs(&["2.2.2.2"]),
        timestamp: SystemTime::now(),
        ttl_ms: 300_000,
        record_type: "A".to_string(),
        source: "dns_resolver".to_string(),
        is_authoritative: false,
    }
}

#[test]
fn test_all_subscribers_receive_events() {
    let bus = EventBus::new();
    let first = Arc::new(AtomicU64::new(0));
    let second = Arc::new(AtomicU64::new(0));

    for counter in [&first, &second] {
        let counter = Arc::clone(counter);
        bus.subscribe_query_start(Arc::new(move |_hostname| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
    }

    bus.publish_query_started("a.test");
    bus.publish_query_started("b.test");
    assert_eq!(first.load(Ordering::SeqCst), 2);
    assert_eq!(second.load(Ordering::SeqCst), 2);
}

#[test]
fn test_failing_subscriber_does_not_block_the_rest() {
    let bus = EventBus::new();
    let reached = Arc::new(AtomicU64::new(0));

    bus.subscribe_address_change(Arc::new(|_event| {
        Err(ResolverError::Subscriber("intentional failure".to_string()))
    }));
    {
        let reached = Arc::clone(&reached);
        bus.subscribe_address_change(Arc::new(move |_event| {
            reached.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
    }

    bus.publish_address_changed(&change_event());
    assert_eq!(reached.load(Ordering::SeqCst), 1);
}

#[test]
fn test_query_complete_carries_addresses_and_outcome() {
    let bus = EventBus::new();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        bus.subscribe_query_complete(Arc::new(move |hostname, addresses, success| {
            seen.lock()
                .unwrap()
                .push((hostname.to_string(), addresses.to_vec(), success));
            Ok(())
        }));
    }

    bus.publish_query_completed("a.test", &addrs(&["1.2.3.4"]), true);
    bus.publish_query_completed("b.test", &[], false);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], ("a.test".to_string(), addrs(&["1.2.3.4"]), true));
    assert_eq!(seen[1], ("b.test".to_string(), Vec::new(), false));
}

#[test]
fn test_unsubscribe_all_clears_every_list() {
    let bus = EventBus::new();
    let calls = Arc::new(AtomicU64::new(0));

    for _ in 0..2 {
        let calls = Arc::clone(&calls);
        bus.subscribe_query_start(Arc::new(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
    }
    {
        let calls = Arc::clone(&calls);
        bus.subscribe_address_change(Arc::new(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
    }

    bus.unsubscribe_all();
    bus.publish_query_started("a.test");
    bus.publish_address_changed(&change_event());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

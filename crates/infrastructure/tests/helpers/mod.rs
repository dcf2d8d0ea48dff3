#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hostwatch_application::ports::QueryStrategy;
use hostwatch_domain::{AddressChangeEvent, ResolveResult, ResolveStatus, ResolverConfig};
use hostwatch_infrastructure::{ConfigStore, EventBus, Resolver};

pub fn addrs(list: &[&str]) -> Vec<IpAddr> {
    list.iter().map(|ip| ip.parse().unwrap()).collect()
}

pub fn test_config() -> ResolverConfig {
    let mut config = ResolverConfig::with_servers(["127.0.0.53"]);
    config.retry.base_delay_ms = 10;
    config.retry.max_delay_ms = 100;
    config
}

pub enum ScriptedOutcome {
    Succeed(Vec<IpAddr>),
    Fail(ResolveStatus),
    /// Never completes until the strategy is shut down.
    Hang,
}

/// Query strategy replaying a scripted sequence of outcomes, one per call.
/// An exhausted script answers `ServerFail`.
pub struct ScriptedStrategy {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    queries: AtomicU64,
    shutdown_calls: AtomicU64,
    initialized: AtomicBool,
}

impl ScriptedStrategy {
    pub fn new(script: Vec<ScriptedOutcome>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            queries: AtomicU64::new(0),
            shutdown_calls: AtomicU64::new(0),
            initialized: AtomicBool::new(true),
        })
    }

    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn shutdown_calls(&self) -> u64 {
        self.shutdown_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryStrategy for ScriptedStrategy {
    async fn query(&self, hostname: &str) -> ResolveResult {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let outcome = self.script.lock().unwrap().pop_front();
        match outcome {
            Some(ScriptedOutcome::Succeed(addresses)) => {
                ResolveResult::success(hostname, addresses, 1)
            }
            Some(ScriptedOutcome::Fail(status)) => ResolveResult::failure(status, hostname, 1),
            Some(ScriptedOutcome::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => ResolveResult::failure(ResolveStatus::ServerFail, hostname, 1),
        }
    }

    async fn shutdown(&self) {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        self.initialized.store(false, Ordering::SeqCst);
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}

/// Event-bus subscriber capturing everything published during a test.
#[derive(Default)]
pub struct EventRecorder {
    pub started: Mutex<Vec<String>>,
    pub completed: Mutex<Vec<(String, Vec<IpAddr>, bool)>>,
    pub changes: Mutex<Vec<AddressChangeEvent>>,
}

impl EventRecorder {
    pub fn subscribe(self: &Arc<Self>, bus: &EventBus) {
        let recorder = Arc::clone(self);
        bus.subscribe_query_start(Arc::new(move |hostname| {
            recorder.started.lock().unwrap().push(hostname.to_string());
            Ok(())
        }));

        let recorder = Arc::clone(self);
        bus.subscribe_query_complete(Arc::new(move |hostname, addresses, success| {
            recorder
                .completed
                .lock()
                .unwrap()
                .push((hostname.to_string(), addresses.to_vec(), success));
            Ok(())
        }));

        let recorder = Arc::clone(self);
        bus.subscribe_address_change(Arc::new(move |event| {
            recorder.changes.lock().unwrap().push(event.clone());
            Ok(())
        }));
    }
}

/// Build an initialized resolver wired to a scripted strategy and an event
/// recorder.
pub fn scripted_resolver(
    config: ResolverConfig,
    strategy: Arc<ScriptedStrategy>,
) -> (Arc<Resolver>, Arc<EventRecorder>) {
    let store = Arc::new(ConfigStore::new(config).unwrap());
    let events = Arc::new(EventBus::new());
    let recorder = Arc::new(EventRecorder::default());
    recorder.subscribe(&events);

    let resolver = Resolver::builder(store)
        .with_event_bus(events)
        .with_strategy("scripted")
        .register_strategy_factory(
            "scripted",
            Box::new(move |_config| Ok(Arc::clone(&strategy) as _)),
        )
        .build();
    resolver.initialize().unwrap();

    (Arc::new(resolver), recorder)
}

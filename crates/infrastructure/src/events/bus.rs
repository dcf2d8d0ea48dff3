use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use hostwatch_domain::{AddressChangeEvent, ResolverError};
use tracing::warn;

use crate::sync::lock;

pub type AddressChangeHandler =
    Arc<dyn Fn(&AddressChangeEvent) -> Result<(), ResolverError> + Send + Sync>;

pub type QueryStartHandler = Arc<dyn Fn(&str) -> Result<(), ResolverError> + Send + Sync>;

/// Arguments: hostname, resolved addresses, success.
pub type QueryCompleteHandler =
    Arc<dyn Fn(&str, &[IpAddr], bool) -> Result<(), ResolverError> + Send + Sync>;

/// Fan-out of address-change, query-start and query-complete events.
///
/// A failing subscriber never prevents the remaining subscribers from
/// running: handlers report failure through their `Result` and the bus logs
/// and moves on. The subscriber list is snapshotted under a short lock and
/// handlers are invoked with no lock held.
#[derive(Default)]
pub struct EventBus {
    address_change: Mutex<Vec<AddressChangeHandler>>,
    query_start: Mutex<Vec<QueryStartHandler>>,
    query_complete: Mutex<Vec<QueryCompleteHandler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_address_change(&self, handler: AddressChangeHandler) {
        lock(&self.address_change).push(handler);
    }

    pub fn subscribe_query_start(&self, handler: QueryStartHandler) {
        lock(&self.query_start).push(handler);
    }

    pub fn subscribe_query_complete(&self, handler: QueryCompleteHandler) {
        lock(&self.query_complete).push(handler);
    }

    pub fn unsubscribe_all(&self) {
        lock(&self.address_change).clear();
        lock(&self.query_start).clear();
        lock(&self.query_complete).clear();
    }

    pub fn publish_address_changed(&self, event: &AddressChangeEvent) {
        let handlers = lock(&self.address_change).clone();
        for handler in handlers {
            if let Err(e) = handler(event) {
                warn!(
                    hostname = %event.hostname,
                    error = %e,
                    "Address-change subscriber failed"
                );
            }
        }
    }

    pub fn publish_query_started(&self, hostname: &str) {
        let handlers = lock(&self.query_start).clone();
        for handler in handlers {
            if let Err(e) = handler(hostname) {
                warn!(hostname = %hostname, error = %e, "Query-start subscriber failed");
            }
        }
    }

    pub fn publish_query_completed(&self, hostname: &str, addresses: &[IpAddr], success: bool) {
        let handlers = lock(&self.query_complete).clone();
        for handler in handlers {
            if let Err(e) = handler(hostname, addresses, success) {
                warn!(hostname = %hostname, error = %e, "Query-complete subscriber failed");
            }
        }
    }
}

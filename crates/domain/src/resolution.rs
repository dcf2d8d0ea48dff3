use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Outcome of a single resolution, mirroring the upstream status taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolveStatus {
    /// Addresses present.
    Success,
    /// Hostname failed validation.
    BadName,
    /// Resolver or strategy not ready.
    NotInitialized,
    /// Concurrent-query ceiling reached.
    Busy,
    /// Upstream answered, but holds no record of the requested type.
    NoData,
    /// Upstream answered NXDOMAIN.
    NotFound,
    /// No healthy upstream, or upstream returned SERVFAIL.
    ServerFail,
    /// Per-attempt timeout expired.
    Timeout,
    /// Resolution was cancelled by shutdown.
    Cancelled,
}

impl ResolveStatus {
    pub fn is_success(self) -> bool {
        self == ResolveStatus::Success
    }

    /// Transient failures are retried; NXDOMAIN and empty answers are
    /// authoritative and are not.
    pub fn is_retryable(self) -> bool {
        matches!(self, ResolveStatus::ServerFail | ResolveStatus::Timeout)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResolveStatus::Success => "success",
            ResolveStatus::BadName => "misformatted hostname",
            ResolveStatus::NotInitialized => "resolver not initialized",
            ResolveStatus::Busy => "concurrent query limit reached",
            ResolveStatus::NoData => "no address records for this name",
            ResolveStatus::NotFound => "domain name not found",
            ResolveStatus::ServerFail => "upstream server failure",
            ResolveStatus::Timeout => "query timed out",
            ResolveStatus::Cancelled => "query cancelled",
        }
    }
}

impl fmt::Display for ResolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully-populated result delivered to the caller for every `resolve` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResult {
    pub status: ResolveStatus,
    pub hostname: String,
    pub addresses: Vec<IpAddr>,
    pub resolution_time_ms: u64,
    pub error: Option<String>,
    pub from_cache: bool,
}

impl ResolveResult {
    pub fn success(hostname: impl Into<String>, addresses: Vec<IpAddr>, elapsed_ms: u64) -> Self {
        Self {
            status: ResolveStatus::Success,
            hostname: hostname.into(),
            addresses,
            resolution_time_ms: elapsed_ms,
            error: None,
            from_cache: false,
        }
    }

    pub fn cached(hostname: impl Into<String>, addresses: Vec<IpAddr>, elapsed_ms: u64) -> Self {
        Self {
            from_cache: true,
            ..Self::success(hostname, addresses, elapsed_ms)
        }
    }

    pub fn failure(status: ResolveStatus, hostname: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            status,
            hostname: hostname.into(),
            addresses: Vec::new(),
            resolution_time_ms: elapsed_ms,
            error: Some(status.as_str().to_string()),
            from_cache: false,
        }
    }

    pub fn failure_with_detail(
        status: ResolveStatus,
        hostname: impl Into<String>,
        elapsed_ms: u64,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(detail.into()),
            ..Self::failure(status, hostname, elapsed_ms)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

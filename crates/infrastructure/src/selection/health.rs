use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_LATENCY_SAMPLES: usize = 100;

/// Health record for one upstream server.
#[derive(Debug, Clone)]
pub struct ServerHealth {
    pub healthy: bool,
    pub error_count: u32,
    /// Arithmetic mean over the last `MAX_LATENCY_SAMPLES` samples.
    pub avg_latency: Duration,
    pub last_check: Option<Instant>,
    samples: VecDeque<Duration>,
}

impl Default for ServerHealth {
    fn default() -> Self {
        Self {
            healthy: true,
            error_count: 0,
            avg_latency: Duration::ZERO,
            last_check: None,
            samples: VecDeque::with_capacity(MAX_LATENCY_SAMPLES),
        }
    }
}

impl ServerHealth {
    pub(crate) fn record_success(&mut self, latency: Duration) {
        if self.samples.len() == MAX_LATENCY_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(latency);

        let total: Duration = self.samples.iter().sum();
        self.avg_latency = total / self.samples.len() as u32;
        self.healthy = true;
        self.error_count = 0;
        self.last_check = Some(Instant::now());
    }

    /// Returns true when this failure flips the server to unhealthy.
    pub(crate) fn record_failure(&mut self, error_threshold: u32) -> bool {
        self.error_count = self.error_count.saturating_add(1);
        if self.error_count > error_threshold && self.healthy {
            self.healthy = false;
            return true;
        }
        false
    }

    pub(crate) fn reset(&mut self) {
        self.healthy = true;
        self.error_count = 0;
    }

    pub fn avg_latency_ms(&self) -> f64 {
        self.avg_latency.as_secs_f64() * 1000.0
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

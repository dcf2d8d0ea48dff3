use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::engine::MetricsEngine;

/// Background job that writes the Prometheus text export to a file on a
/// fixed interval, until cancelled.
pub struct MetricsReporter {
    metrics: Arc<MetricsEngine>,
    path: PathBuf,
    interval: Duration,
    shutdown: CancellationToken,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<MetricsEngine>, path: impl Into<PathBuf>, interval_secs: u32) -> Self {
        Self {
            metrics,
            path: path.into(),
            interval: Duration::from_secs(u64::from(interval_secs.max(1))),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        info!(
            path = %self.path.display(),
            interval_secs = self.interval.as_secs(),
            "Starting metrics reporter"
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            // The first tick fires immediately and produces an initial report.
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("Metrics reporter shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let report = self.metrics.prometheus();
                        if let Err(e) = tokio::fs::write(&self.path, report).await {
                            error!(
                                error = %e,
                                path = %self.path.display(),
                                "Failed to write metrics report"
                            );
                        }
                    }
                }
            }
        })
    }
}

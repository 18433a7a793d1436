//! Telemetry module
//!
//! Logging and metrics. Metrics are rendered in Prometheus text format to a
//! file when the run ends, for a node exporter textfile collector to pick up.

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{increment, record_latency, set_accepted, CounterMetric, LatencyMetric};

use crate::config::TelemetryConfig;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::PathBuf;

/// Guard that flushes metrics on drop
pub struct TelemetryGuard {
    metrics: Option<(PrometheusHandle, PathBuf)>,
}

impl TelemetryGuard {
    /// Write the current metrics snapshot to the configured file
    pub fn flush(&self) -> anyhow::Result<()> {
        if let Some((handle, path)) = &self.metrics {
            std::fs::write(path, handle.render())?;
            tracing::debug!(path = ?path, "Metrics written");
        }
        Ok(())
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "Failed to write metrics");
        }
    }
}

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level, config.log_format)?;

    let metrics = match &config.metrics_file {
        Some(path) => {
            let handle = PrometheusBuilder::new().install_recorder()?;
            Some((handle, path.clone()))
        }
        None => None,
    };

    Ok(TelemetryGuard { metrics })
}

//! Prometheus metrics

use crate::quantity::Quantity;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::time::Duration;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Source read failed or was rejected, labelled by source
    SourceFailure,
    /// Sources disagreed beyond tolerance, labelled by quantity
    QuorumDisagreement,
    /// Candidate moved against its direction, labelled by quantity
    MonotonicViolation,
    /// Previous value served instead of a fresh one, labelled by quantity
    StaleFallback,
}

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// One source fetch, labelled by source
    SourceFetch,
}

impl CounterMetric {
    fn name_and_label(&self) -> (&'static str, &'static str) {
        match self {
            CounterMetric::SourceFailure => ("supdog_source_failures_total", "source"),
            CounterMetric::QuorumDisagreement => ("supdog_quorum_disagreements_total", "quantity"),
            CounterMetric::MonotonicViolation => ("supdog_monotonic_violations_total", "quantity"),
            CounterMetric::StaleFallback => ("supdog_stale_fallbacks_total", "quantity"),
        }
    }
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric, label: &str) {
    let (name, key) = metric.name_and_label();
    ::metrics::counter!(name, key => label.to_string()).increment(1);
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, label: &str, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::SourceFetch => "supdog_source_fetch_latency_ms",
    };

    ::metrics::histogram!(metric_name, "source" => label.to_string())
        .record(duration.as_secs_f64() * 1000.0);
}

/// Publish the latest accepted value of a quantity
pub fn set_accepted(quantity: Quantity, value: Decimal) {
    if let Some(value) = value.to_f64() {
        ::metrics::gauge!("supdog_accepted_value", "quantity" => quantity.name()).set(value);
    }
}

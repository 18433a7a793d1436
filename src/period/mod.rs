//! Period aggregation
//!
//! Folds accepted values into per-period logs and derives volume estimates
//! and the dashboard series from them.

mod aggregator;
mod dashboard;
mod types;
mod volume;

pub use aggregator::{Granularity, PeriodAggregator, PeriodClock};
pub use dashboard::{build_dashboard, DashboardRow, DASHBOARD_DOCUMENT};
pub use types::{AggregateError, AppendOutcome, PeriodLog, PeriodRecord};
pub use volume::{estimate_volume, VolumeEstimate, VOLUME_ESTIMATE_DOCUMENT};

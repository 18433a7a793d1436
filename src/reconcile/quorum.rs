//! Quorum reconciliation of independent readings

use super::{Basis, QuorumDisagreement, ReconcileError, ReconciledValue};
use crate::config::ReconcileConfig;
use crate::quantity::Quantity;
use crate::source::Reading;
use crate::telemetry::{self, CounterMetric};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Combines readings of one quantity into a single trusted value.
///
/// Policy, in order:
/// 1. drop readings that are not `ok`
/// 2. a single survivor is trusted alone
/// 3. several survivors within tolerance of each other are averaged;
///    otherwise the highest-ranked survivor wins
/// 4. with no survivors the persisted fallback is served as stale
pub struct Reconciler {
    tolerance: Decimal,
}

impl Reconciler {
    /// Create a reconciler with the given relative agreement tolerance
    pub fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }

    pub fn from_config(config: &ReconcileConfig) -> Self {
        Self::new(config.agreement_tolerance)
    }

    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// Reconcile readings, in source rank order, against an optional fallback
    pub fn reconcile(
        &self,
        quantity: Quantity,
        readings: &[Reading],
        fallback: Option<ReconciledValue>,
    ) -> Result<ReconciledValue, ReconcileError> {
        let usable: Vec<(&Reading, Decimal)> = readings
            .iter()
            .filter_map(|r| r.usable_value().map(|v| (r, v)))
            .collect();

        let timestamp = usable
            .iter()
            .map(|(r, _)| r.observed_at)
            .max()
            .unwrap_or_else(Utc::now);

        match usable.as_slice() {
            [] => match fallback {
                Some(previous) => {
                    tracing::warn!(
                        quantity = %quantity,
                        value = %previous.value,
                        since = %previous.timestamp,
                        "All sources failed, serving last persisted value"
                    );
                    Ok(previous.retag(Basis::StaleFallback))
                }
                None => Err(ReconcileError::NoData(quantity)),
            },
            [(reading, value)] => {
                tracing::info!(
                    quantity = %quantity,
                    source = %reading.source_id,
                    value = %value,
                    "Single usable source"
                );
                Ok(ReconciledValue::new(
                    quantity,
                    *value,
                    timestamp,
                    Basis::SingleSourceFallback,
                ))
            }
            [(primary, primary_value), ..] => {
                let values: Vec<Decimal> = usable.iter().map(|(_, v)| *v).collect();
                let spread = max_pairwise_disagreement(&values);

                if spread <= self.tolerance {
                    let Some(mean) = mean(&values) else {
                        tracing::warn!(
                            quantity = %quantity,
                            source = %primary.source_id,
                            "Mean out of range, trusting primary"
                        );
                        return Ok(ReconciledValue::new(
                            quantity,
                            *primary_value,
                            timestamp,
                            Basis::SingleSourceFallback,
                        ));
                    };
                    tracing::info!(
                        quantity = %quantity,
                        sources = values.len(),
                        %spread,
                        value = %mean,
                        "Sources agree"
                    );
                    Ok(ReconciledValue::new(quantity, mean, timestamp, Basis::Agreed))
                } else {
                    let disagreement = QuorumDisagreement {
                        quantity,
                        spread,
                        tolerance: self.tolerance,
                        primary: primary.source_id.clone(),
                    };
                    tracing::warn!(%disagreement, "Quorum disagreement");
                    telemetry::increment(CounterMetric::QuorumDisagreement, quantity.name());
                    Ok(ReconciledValue::new(
                        quantity,
                        *primary_value,
                        timestamp,
                        Basis::SingleSourceFallback,
                    ))
                }
            }
        }
    }
}

/// Arithmetic mean, `None` when the sum leaves the decimal range
fn mean(values: &[Decimal]) -> Option<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |sum, v| sum.checked_add(*v))?
        .checked_div(Decimal::from(values.len()))
}

/// `|a - b| / mean(a, b)`, zero when both are zero.
///
/// Saturates at `Decimal::MAX` when the ratio is out of range.
pub fn relative_disagreement(a: Decimal, b: Decimal) -> Decimal {
    if a == b {
        return Decimal::ZERO;
    }
    (a / dec!(2))
        .checked_add(b / dec!(2))
        .filter(|mean| !mean.is_zero())
        .and_then(|mean| {
            let diff = a.checked_sub(b)?;
            diff.abs().checked_div(mean.abs())
        })
        .unwrap_or(Decimal::MAX)
}

/// Largest relative disagreement over every pair of values
pub fn max_pairwise_disagreement(values: &[Decimal]) -> Decimal {
    let mut max = Decimal::ZERO;
    for (i, a) in values.iter().enumerate() {
        for b in &values[i + 1..] {
            max = max.max(relative_disagreement(*a, *b));
        }
    }
    max
}

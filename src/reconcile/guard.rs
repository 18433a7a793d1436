//! Monotonic guard for directional quantities

use super::{Basis, MonotonicityViolation, ReconciledValue};
use crate::quantity::{Direction, Quantity};
use crate::store::PersistedState;
use crate::telemetry::{self, CounterMetric};
use rust_decimal::Decimal;

/// Rejects candidates that move a quantity against its declared direction.
///
/// The previous persisted value is always a valid state, so a rejected
/// candidate is replaced by it rather than failing the run.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicGuard;

impl MonotonicGuard {
    pub fn new() -> Self {
        Self
    }

    /// Check a candidate value against the previous one
    pub fn check(
        quantity: Quantity,
        candidate: Decimal,
        previous: Decimal,
    ) -> Result<(), MonotonicityViolation> {
        let violated = match quantity.direction() {
            Direction::Free => false,
            Direction::NonIncreasing => candidate > previous,
            Direction::NonDecreasing => candidate < previous,
        };

        if violated {
            Err(MonotonicityViolation {
                quantity,
                candidate,
                previous,
            })
        } else {
            Ok(())
        }
    }

    /// Return the candidate, or the previous value when the candidate violates
    /// the quantity's direction
    pub fn guard(
        &self,
        candidate: ReconciledValue,
        previous: Option<&PersistedState>,
    ) -> ReconciledValue {
        let Some(previous) = previous else {
            return candidate;
        };

        match Self::check(candidate.quantity, candidate.value, previous.value) {
            Ok(()) => candidate,
            Err(violation) => {
                tracing::warn!(%violation, "Monotonicity violation");
                telemetry::increment(CounterMetric::MonotonicViolation, candidate.quantity.name());
                previous.to_reconciled(candidate.quantity, Basis::StaleFallback)
            }
        }
    }
}

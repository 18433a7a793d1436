//! Reconciliation types

use crate::quantity::Quantity;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a reconciled value was arrived at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Basis {
    /// Two or more sources agreed within tolerance
    Agreed,
    /// One source was trusted on its own
    SingleSourceFallback,
    /// No fresh value; the last persisted value is being served
    StaleFallback,
}

/// One trusted value for a quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledValue {
    pub quantity: Quantity,
    pub value: Decimal,
    pub timestamp: DateTime<Utc>,
    pub basis: Basis,
}

impl ReconciledValue {
    pub fn new(quantity: Quantity, value: Decimal, timestamp: DateTime<Utc>, basis: Basis) -> Self {
        Self {
            quantity,
            value,
            timestamp,
            basis,
        }
    }

    /// Same value, different basis
    pub fn retag(self, basis: Basis) -> Self {
        Self { basis, ..self }
    }

    pub fn is_stale(&self) -> bool {
        self.basis == Basis::StaleFallback
    }
}

/// Fatal reconciliation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// No source succeeded and nothing was persisted before
    #[error("no data for {0}: every source failed and no previous value exists")]
    NoData(Quantity),
}

/// Sources disagreed beyond tolerance. Resolved by trusting the primary.
#[derive(Debug, Error)]
#[error("{quantity} sources disagree by {spread} (tolerance {tolerance}), trusting {primary}")]
pub struct QuorumDisagreement {
    pub quantity: Quantity,
    pub spread: Decimal,
    pub tolerance: Decimal,
    pub primary: String,
}

/// A candidate contradicted the quantity's declared direction
#[derive(Debug, Error)]
#[error("{quantity} moved {candidate} against previous {previous}, keeping previous")]
pub struct MonotonicityViolation {
    pub quantity: Quantity,
    pub candidate: Decimal,
    pub previous: Decimal,
}

//! Persisted state store
//!
//! Durable last-known-good value per quantity, period logs, and derived
//! documents for the dashboard. Consistency is last-writer-wins per
//! quantity; runs are expected not to overlap.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::period::{PeriodLog, PeriodRecord};
use crate::quantity::Quantity;
use crate::reconcile::{Basis, ReconciledValue};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Most recent accepted value of one quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub value: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl PersistedState {
    pub fn to_reconciled(&self, quantity: Quantity, basis: Basis) -> ReconciledValue {
        ReconciledValue::new(quantity, self.value, self.timestamp, basis)
    }
}

impl From<&ReconciledValue> for PersistedState {
    fn from(value: &ReconciledValue) -> Self {
        Self {
            value: value.value,
            timestamp: value.timestamp,
        }
    }
}

/// Store errors.
///
/// "Nothing stored yet" is not an error: loads return `Ok(None)` or an
/// empty log for that case.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage could not be read or written
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Stored data exists but cannot be understood
    #[error("corrupt state in {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    /// Value could not be encoded for storage
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. })
    }
}

/// Storage backend for accepted values, period logs and derived documents
pub trait StateStore: Send + Sync {
    /// Last accepted value of a quantity
    fn load(&self, quantity: Quantity) -> Result<Option<PersistedState>, StoreError>;
    /// Overwrite the last accepted value of a quantity
    fn save(&self, quantity: Quantity, value: &ReconciledValue) -> Result<(), StoreError>;
    /// Records of a period log, ascending by key
    fn load_log(&self, log: PeriodLog) -> Result<Vec<PeriodRecord>, StoreError>;
    /// Replace a period log
    fn save_log(&self, log: PeriodLog, records: &[PeriodRecord]) -> Result<(), StoreError>;
    /// Write a derived JSON document such as the dashboard series
    fn write_document(&self, name: &str, document: &serde_json::Value) -> Result<(), StoreError>;
}

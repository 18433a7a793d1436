//! Source reading types

use crate::quantity::Quantity;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Why a single source read failed
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-2xx response or an API-level error status
    #[error("bad status: {0}")]
    Status(String),
    /// JSON-RPC call failed or returned undecodable data
    #[error("rpc call failed: {0}")]
    Rpc(String),
    /// Payload did not have the expected shape
    #[error("malformed payload: {0}")]
    Malformed(String),
    /// Required API credential is not configured
    #[error("missing credential: environment variable {0} is not set")]
    MissingCredential(String),
    /// Source did not answer in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// Value was well-formed but failed the sanity filter
    #[error("rejected value {0}: {1}")]
    Rejected(Decimal, &'static str),
}

/// A single observation of a quantity from one source.
///
/// Readings only live for one reconciliation attempt and are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Which source produced this reading
    pub source_id: String,
    /// Observed value, absent when the read failed
    pub value: Option<Decimal>,
    /// When the read completed
    pub observed_at: DateTime<Utc>,
    /// Whether the call succeeded and the value passed the sanity filter
    pub ok: bool,
}

impl Reading {
    /// A successful, already-sanitized reading
    pub fn success(source_id: impl Into<String>, value: Decimal) -> Self {
        Self {
            source_id: source_id.into(),
            value: Some(value),
            observed_at: Utc::now(),
            ok: true,
        }
    }

    /// A failed reading
    pub fn failure(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            value: None,
            observed_at: Utc::now(),
            ok: false,
        }
    }

    /// The value, only if this reading is usable
    pub fn usable_value(&self) -> Option<Decimal> {
        if self.ok {
            self.value
        } else {
            None
        }
    }
}

/// Per-quantity plausibility check applied to every raw value
#[derive(Debug, Clone, Copy)]
pub struct SanityFilter {
    allow_zero: bool,
}

impl SanityFilter {
    pub fn for_quantity(quantity: Quantity) -> Self {
        Self {
            allow_zero: quantity.allows_zero(),
        }
    }

    pub fn check(&self, value: Decimal) -> Result<Decimal, SourceError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(SourceError::Rejected(value, "negative"));
        }
        if value.is_zero() && !self.allow_zero {
            return Err(SourceError::Rejected(value, "zero"));
        }
        Ok(value)
    }
}

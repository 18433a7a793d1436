//! Reconciliation module
//!
//! Turns untrusted readings into one trusted value per quantity and keeps
//! directional quantities from moving the wrong way across runs.

mod guard;
mod quorum;
mod types;

pub use guard::MonotonicGuard;
pub use quorum::{max_pairwise_disagreement, relative_disagreement, Reconciler};
pub use types::{Basis, MonotonicityViolation, QuorumDisagreement, ReconcileError, ReconciledValue};

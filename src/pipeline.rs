//! Acquisition pipeline
//!
//! One pass for one quantity: load the previous value, read every source,
//! reconcile, guard the direction, persist. Only fresh values are written
//! back; a stale fallback leaves the store as it was.

use crate::config::{Config, CorruptPolicy};
use crate::quantity::Quantity;
use crate::reconcile::{Basis, MonotonicGuard, ReconcileError, ReconciledValue, Reconciler};
use crate::source::{self, Reading, SanityFilter, Source};
use crate::store::{PersistedState, StateStore, StoreError};
use crate::telemetry::{self, CounterMetric};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Fatal acquisition errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reconciles and persists quantities against one store
pub struct Pipeline {
    store: Arc<dyn StateStore>,
    reconciler: Reconciler,
    guard: MonotonicGuard,
    source_timeout: Duration,
    on_corrupt: CorruptPolicy,
}

impl Pipeline {
    pub fn new(store: Arc<dyn StateStore>, reconciler: Reconciler, source_timeout: Duration) -> Self {
        Self {
            store,
            reconciler,
            guard: MonotonicGuard::new(),
            source_timeout,
            on_corrupt: CorruptPolicy::Fail,
        }
    }

    pub fn from_config(store: Arc<dyn StateStore>, config: &Config) -> Self {
        Self::new(
            store,
            Reconciler::from_config(&config.reconcile),
            Duration::from_secs(config.reconcile.source_timeout_secs),
        )
        .with_corrupt_policy(config.store.on_corrupt)
    }

    pub fn with_corrupt_policy(mut self, policy: CorruptPolicy) -> Self {
        self.on_corrupt = policy;
        self
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Previous value, with unreadable state handled per the corrupt policy
    pub fn load_previous(&self, quantity: Quantity) -> Result<Option<PersistedState>, PipelineError> {
        match self.store.load(quantity) {
            Ok(state) => Ok(state),
            Err(e) if e.is_corrupt() && self.on_corrupt == CorruptPolicy::Ignore => {
                tracing::warn!(quantity = %quantity, error = %e, "Ignoring corrupt state");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read every source for `quantity` and settle the readings
    pub async fn acquire(
        &self,
        quantity: Quantity,
        sources: &[Box<dyn Source>],
    ) -> Result<ReconciledValue, PipelineError> {
        let previous = self.load_previous(quantity)?;
        let readings = source::read_all(quantity, sources, self.source_timeout).await;
        self.settle(quantity, &readings, previous)
    }

    /// Reconcile readings already taken, guard and persist the result
    pub fn settle(
        &self,
        quantity: Quantity,
        readings: &[Reading],
        previous: Option<PersistedState>,
    ) -> Result<ReconciledValue, PipelineError> {
        let fallback = previous
            .as_ref()
            .map(|p| p.to_reconciled(quantity, Basis::StaleFallback));
        let candidate = self.reconciler.reconcile(quantity, readings, fallback)?;
        let accepted = self.guard.guard(candidate, previous.as_ref());
        self.commit(&accepted)?;
        Ok(accepted)
    }

    /// Accept a value computed from another quantity.
    ///
    /// The derived value inherits the input's timestamp and basis, so a stale
    /// input yields a stale (unsaved) result.
    pub fn derive(
        &self,
        quantity: Quantity,
        value: Decimal,
        input: &ReconciledValue,
    ) -> Result<ReconciledValue, PipelineError> {
        let previous = self.load_previous(quantity)?;

        let candidate = match SanityFilter::for_quantity(quantity).check(value) {
            Ok(value) => ReconciledValue::new(quantity, value, input.timestamp, input.basis),
            Err(e) => {
                tracing::warn!(quantity = %quantity, error = %e, "Derived value rejected");
                previous
                    .as_ref()
                    .map(|p| p.to_reconciled(quantity, Basis::StaleFallback))
                    .ok_or(ReconcileError::NoData(quantity))?
            }
        };

        let accepted = self.guard.guard(candidate, previous.as_ref());
        self.commit(&accepted)?;
        Ok(accepted)
    }

    fn commit(&self, value: &ReconciledValue) -> Result<(), PipelineError> {
        if value.is_stale() {
            telemetry::increment(CounterMetric::StaleFallback, value.quantity.name());
            tracing::info!(
                quantity = %value.quantity,
                value = %value.value,
                since = %value.timestamp,
                "Serving stale value, store unchanged"
            );
            return Ok(());
        }

        self.store.save(value.quantity, value)?;
        telemetry::set_accepted(value.quantity, value.value);
        tracing::info!(
            quantity = %value.quantity,
            value = %value.value,
            basis = ?value.basis,
            "Accepted"
        );
        Ok(())
    }
}

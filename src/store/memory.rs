//! In-memory store for tests and dry runs

use super::{PersistedState, StateStore, StoreError};
use crate::period::{PeriodLog, PeriodRecord};
use crate::quantity::Quantity;
use crate::reconcile::ReconciledValue;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Inner {
    values: HashMap<Quantity, PersistedState>,
    logs: HashMap<PeriodLog, Vec<PeriodRecord>>,
    documents: HashMap<String, serde_json::Value>,
    corrupt: HashSet<Quantity>,
}

/// Store backed by process memory
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a previous value
    pub fn with_value(self, quantity: Quantity, state: PersistedState) -> Self {
        self.lock().values.insert(quantity, state);
        self
    }

    /// Seed a period log
    pub fn with_log(self, log: PeriodLog, records: Vec<PeriodRecord>) -> Self {
        self.lock().logs.insert(log, records);
        self
    }

    /// Make loads of a quantity report corrupt state until it is saved again
    pub fn mark_corrupt(&self, quantity: Quantity) {
        self.lock().corrupt.insert(quantity);
    }

    /// A previously written document
    pub fn document(&self, name: &str) -> Option<serde_json::Value> {
        self.lock().documents.get(name).cloned()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, quantity: Quantity) -> Result<Option<PersistedState>, StoreError> {
        let inner = self.lock();
        if inner.corrupt.contains(&quantity) {
            return Err(StoreError::Corrupt {
                path: PathBuf::from(quantity.file_name()),
                reason: "marked corrupt".to_string(),
            });
        }
        Ok(inner.values.get(&quantity).cloned())
    }

    fn save(&self, quantity: Quantity, value: &ReconciledValue) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.corrupt.remove(&quantity);
        inner.values.insert(quantity, PersistedState::from(value));
        Ok(())
    }

    fn load_log(&self, log: PeriodLog) -> Result<Vec<PeriodRecord>, StoreError> {
        Ok(self.lock().logs.get(&log).cloned().unwrap_or_default())
    }

    fn save_log(&self, log: PeriodLog, records: &[PeriodRecord]) -> Result<(), StoreError> {
        self.lock().logs.insert(log, records.to_vec());
        Ok(())
    }

    fn write_document(&self, name: &str, document: &serde_json::Value) -> Result<(), StoreError> {
        self.lock()
            .documents
            .insert(name.to_string(), document.clone());
        Ok(())
    }
}

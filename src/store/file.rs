//! File-backed store: one pretty-printed JSON file per quantity group

use super::{PersistedState, StateStore, StoreError};
use crate::period::{PeriodLog, PeriodRecord};
use crate::quantity::Quantity;
use crate::reconcile::ReconciledValue;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Field holding the time of the last write in every quantity file
const TIMESTAMP_FIELD: &str = "timestamp";

/// Stores state as flat JSON files under a stats directory.
///
/// Quantity files look like `{ "price": 602.5, "timestamp": "..." }`. Files
/// shared by several quantities keep every sibling field on save. Writes go
/// to a temporary file first and are renamed into place.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Read and parse a JSON file, `None` when it does not exist
    fn read_json(&self, path: &Path) -> Result<Option<Value>, StoreError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Write via temp file + rename so readers never see a partial file
    fn write_json(&self, path: &Path, value: &Value) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }

    fn corrupt(path: &Path, reason: impl Into<String>) -> StoreError {
        StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl StateStore for FileStore {
    fn load(&self, quantity: Quantity) -> Result<Option<PersistedState>, StoreError> {
        let path = self.path(quantity.file_name());
        let Some(json) = self.read_json(&path)? else {
            return Ok(None);
        };

        let object = json
            .as_object()
            .ok_or_else(|| Self::corrupt(&path, "expected a JSON object"))?;

        let Some(raw) = object.get(quantity.field()) else {
            return Ok(None);
        };

        let value: Decimal = match raw {
            Value::Number(_) => serde_json::from_value(raw.clone())
                .map_err(|e| Self::corrupt(&path, format!("{}: {}", quantity.field(), e)))?,
            other => {
                return Err(Self::corrupt(
                    &path,
                    format!("{} is not a number: {}", quantity.field(), other),
                ))
            }
        };

        let timestamp = object
            .get(TIMESTAMP_FIELD)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| Self::corrupt(&path, "missing or invalid timestamp"))?;

        Ok(Some(PersistedState { value, timestamp }))
    }

    fn save(&self, quantity: Quantity, value: &ReconciledValue) -> Result<(), StoreError> {
        let path = self.path(quantity.file_name());

        let mut object = match self.read_json(&path) {
            Ok(Some(Value::Object(object))) => object,
            Ok(_) => Map::new(),
            Err(e) if e.is_corrupt() => {
                tracing::warn!(error = %e, "Overwriting unreadable stats file");
                Map::new()
            }
            Err(e) => return Err(e),
        };

        object.insert(quantity.field().to_string(), serde_json::to_value(value.value)?);
        object.insert(
            TIMESTAMP_FIELD.to_string(),
            Value::String(value.timestamp.to_rfc3339()),
        );

        self.write_json(&path, &Value::Object(object))?;
        tracing::debug!(quantity = %quantity, path = ?path, "Saved state");
        Ok(())
    }

    fn load_log(&self, log: PeriodLog) -> Result<Vec<PeriodRecord>, StoreError> {
        let path = self.path(log.file_name());
        match self.read_json(&path)? {
            None => Ok(Vec::new()),
            Some(json) => serde_json::from_value(json).map_err(|e| Self::corrupt(&path, e.to_string())),
        }
    }

    fn save_log(&self, log: PeriodLog, records: &[PeriodRecord]) -> Result<(), StoreError> {
        let path = self.path(log.file_name());
        self.write_json(&path, &serde_json::to_value(records)?)
    }

    fn write_document(&self, name: &str, document: &Value) -> Result<(), StoreError> {
        self.write_json(&self.path(name), document)
    }
}

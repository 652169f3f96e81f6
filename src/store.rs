//! Persistence collaborator boundary.
//!
//! Devices that reach `Ready` are remembered as [`AttachedRecord`]s so a
//! later attach request can retrieve them instead of scanning. The store
//! is append-only from the coordinator's perspective and is always called
//! from inside the serialized worker, so a blocking local round trip is
//! acceptable.

use crate::engine::EffectError;
use crate::radio::{DeviceId, ServiceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// A persisted (device, service) pair marking a successfully reached
/// device.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct AttachedRecord {
    pub device: DeviceId,
    pub service: ServiceId,
    pub attached_at: DateTime<Utc>,
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding attached records failed: {0}")]
    Serialization(String),

    #[error("decoding attached records failed: {0}")]
    Deserialization(String),
}

impl From<StoreError> for EffectError {
    fn from(error: StoreError) -> Self {
        EffectError::Failed(error.to_string())
    }
}

/// External collaborator persisting attached-device records.
pub trait AttachedStore: Send + Sync {
    /// Load previously attached devices whose recorded service id matches
    /// `service`.
    fn load_attached(&self, service: &ServiceId) -> Result<Vec<AttachedRecord>, StoreError>;

    /// Append records for newly attached devices.
    fn save_attached(&self, records: &[AttachedRecord]) -> Result<(), StoreError>;
}

/// In-memory store. The default collaborator, and the one tests use.
pub struct MemoryStore {
    records: Mutex<Vec<AttachedRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// All records, regardless of service.
    pub fn records(&self) -> Vec<AttachedRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AttachedStore for MemoryStore {
    fn load_attached(&self, service: &ServiceId) -> Result<Vec<AttachedRecord>, StoreError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records
            .iter()
            .filter(|record| record.service == *service)
            .cloned()
            .collect())
    }

    fn save_attached(&self, records: &[AttachedRecord]) -> Result<(), StoreError> {
        let mut stored = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        stored.extend_from_slice(records);
        Ok(())
    }
}

/// File-backed store keeping all records in a single JSON document.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<Vec<AttachedRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(|e| StoreError::Deserialization(e.to_string()))
    }
}

impl AttachedStore for JsonStore {
    fn load_attached(&self, service: &ServiceId) -> Result<Vec<AttachedRecord>, StoreError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|record| record.service == *service)
            .collect())
    }

    fn save_attached(&self, records: &[AttachedRecord]) -> Result<(), StoreError> {
        let mut all = self.read_all()?;
        all.extend_from_slice(records);
        let contents = serde_json::to_string_pretty(&all)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

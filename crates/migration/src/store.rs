use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use thiserror::Error;

use crate::MigrationState;

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("state read failed: {0}")]
    ReadFailed(String),

    #[error("state write failed: {0}")]
    WriteFailed(String),

    #[error("state serialization failed: {0}")]
    Serialization(String),
}

/// Durable storage for the migration state record.
///
/// The controller saves after every phase transition and loads on startup;
/// backends only need to make a committed save survive a process crash.
#[async_trait]
pub trait MigrationStateStore: Send + Sync {
    async fn load(&self) -> Result<Option<MigrationState>, StateStoreError>;
    async fn save(&self, state: &MigrationState) -> Result<(), StateStoreError>;
}

/// In-memory backend for tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStateStore {
    state: Arc<RwLock<Option<MigrationState>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, bypassing the trait (for test assertions).
    pub fn snapshot(&self) -> Option<MigrationState> {
        self.state.read().unwrap().clone()
    }
}

#[async_trait]
impl MigrationStateStore for InMemoryStateStore {
    async fn load(&self) -> Result<Option<MigrationState>, StateStoreError> {
        Ok(self.state.read().unwrap().clone())
    }

    async fn save(&self, state: &MigrationState) -> Result<(), StateStoreError> {
        *self.state.write().unwrap() = Some(state.clone());
        Ok(())
    }
}

/// File-backed backend: one pretty-printed JSON document the operator can
/// read and, in the worst case, fix by hand.
#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl MigrationStateStore for JsonFileStateStore {
    async fn load(&self) -> Result<Option<MigrationState>, StateStoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| StateStoreError::ReadFailed(e.to_string()))?;
        let state = serde_json::from_str(&content)
            .map_err(|e| StateStoreError::Serialization(e.to_string()))?;
        Ok(Some(state))
    }

    async fn save(&self, state: &MigrationState) -> Result<(), StateStoreError> {
        let content = serde_json::to_string_pretty(state)
            .map_err(|e| StateStoreError::Serialization(e.to_string()))?;

        // Write-then-rename so a crash mid-write cannot truncate the only
        // copy of the committed phase.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content)
            .map_err(|e| StateStoreError::WriteFailed(e.to_string()))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| StateStoreError::WriteFailed(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), phase = %state.phase, "Migration state persisted");
        Ok(())
    }
}

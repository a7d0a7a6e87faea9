use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::OutputRecord;

#[derive(Debug, Error)]
pub enum OutputError {
    /// The run completed but its record already exists. Outputs are
    /// write-once; overwriting one would orphan the addresses it held.
    #[error("output record already exists at {path}")]
    AlreadyExists { path: PathBuf },

    /// The run's logical work succeeded but the record could not be
    /// written. Surfaced loudly: losing this file means losing the address
    /// table needed for recovery.
    #[error("failed to write output record to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read output record from {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("output record at {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Persists the output record to a fixed, human-inspectable JSON location.
#[derive(Debug, Clone)]
pub struct OutputStore {
    path: PathBuf,
}

impl OutputStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the record. Refuses to overwrite an existing one.
    pub fn write(&self, record: &OutputRecord) -> Result<(), OutputError> {
        if self.path.exists() {
            return Err(OutputError::AlreadyExists {
                path: self.path.clone(),
            });
        }

        let content = serde_json::to_string_pretty(record).map_err(|source| {
            OutputError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content).map_err(|source| OutputError::WriteFailed {
            path: self.path.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| OutputError::WriteFailed {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!(
            path = %self.path.display(),
            units = record.addresses.len(),
            "Output record written"
        );
        Ok(())
    }

    pub fn read(&self) -> Result<OutputRecord, OutputError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| OutputError::ReadFailed {
                path: self.path.clone(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|source| OutputError::Malformed {
            path: self.path.clone(),
            source,
        })
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Document store for incident records.
//!
//! Incidents are stored as newline-delimited JSON, one document per line.
//! The store is schemaless on read: [`DocumentStore::load_documents`]
//! hands back raw JSON objects so the training pipeline can decide for
//! itself which fields are required, while
//! [`DocumentStore::load_incidents`] deserializes into typed
//! [`IncidentDocument`]s for the dashboard.

pub mod paths;
pub mod progress;
pub mod queries;

use std::fs::File;
use std::io::{BufRead as _, BufReader, BufWriter, Write as _};
use std::path::{Path, PathBuf};

use incident_predict_incident_models::IncidentDocument;
use thiserror::Error;

/// A raw stored document: a JSON object with no schema applied.
pub type RawDocument = serde_json::Map<String, serde_json::Value>;

/// Errors that can occur while reading or writing the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A line did not contain valid JSON or did not match the document
    /// shape.
    #[error("Invalid document on line {line}: {source}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// A line contained valid JSON that was not an object.
    #[error("Line {line} is not a JSON object")]
    NotAnObject {
        /// 1-based line number.
        line: usize,
    },

    /// A document could not be serialized.
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Handle to an NDJSON-backed incident collection.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    /// Opens a store backed by the file at `path`. The file is not touched
    /// until a read or write is requested.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Reads every non-blank line as a raw JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read or a line is not a
    /// JSON object.
    pub fn load_documents(&self) -> Result<Vec<RawDocument>, StoreError> {
        let mut documents = Vec::new();

        for (idx, line) in self.lines()? {
            let value: serde_json::Value = serde_json::from_str(&line)
                .map_err(|source| StoreError::Parse { line: idx, source })?;
            match value {
                serde_json::Value::Object(map) => documents.push(map),
                _ => return Err(StoreError::NotAnObject { line: idx }),
            }
        }

        log::debug!(
            "Loaded {} raw documents from {}",
            documents.len(),
            self.path.display()
        );
        Ok(documents)
    }

    /// Reads every non-blank line as a typed [`IncidentDocument`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read or a line does not
    /// match the incident document shape.
    pub fn load_incidents(&self) -> Result<Vec<IncidentDocument>, StoreError> {
        let mut incidents = Vec::new();

        for (idx, line) in self.lines()? {
            let incident = serde_json::from_str(&line)
                .map_err(|source| StoreError::Parse { line: idx, source })?;
            incidents.push(incident);
        }

        log::debug!(
            "Loaded {} incidents from {}",
            incidents.len(),
            self.path.display()
        );
        Ok(incidents)
    }

    /// Replaces the whole collection with `incidents`.
    ///
    /// Creates the parent directory if needed. Returns the number of
    /// documents written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be written or a document
    /// fails to serialize.
    pub fn replace_all(&self, incidents: &[IncidentDocument]) -> Result<u64, StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            paths::ensure_dir(parent).map_err(|e| self.io_error(e))?;
        }

        let file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        let mut writer = BufWriter::new(file);

        for incident in incidents {
            serde_json::to_writer(&mut writer, incident)?;
            writer.write_all(b"\n").map_err(|e| self.io_error(e))?;
        }
        writer.flush().map_err(|e| self.io_error(e))?;

        log::info!(
            "Wrote {} incidents to {}",
            incidents.len(),
            self.path.display()
        );
        Ok(incidents.len() as u64)
    }

    /// Counts the stored documents without parsing them.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read.
    pub fn count(&self) -> Result<u64, StoreError> {
        Ok(self.lines()?.len() as u64)
    }

    /// Returns `(1-based line number, line)` for every non-blank line.
    fn lines(&self) -> Result<Vec<(usize, String)>, StoreError> {
        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        let reader = BufReader::new(file);

        let mut lines = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;
            if !line.trim().is_empty() {
                lines.push((idx + 1, line));
            }
        }
        Ok(lines)
    }
}

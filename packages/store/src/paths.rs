#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the data directory.
//!
//! All paths are relative to the project root's `data/` directory unless
//! overridden through the environment.

use std::path::{Path, PathBuf};

/// Environment variable overriding the corpus file location.
pub const DATA_PATH_ENV: &str = "INCIDENT_DATA";

/// Environment variable overriding the artifact directory location.
pub const ARTIFACTS_DIR_ENV: &str = "INCIDENT_ARTIFACTS";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`, falling back to the
/// current directory.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the default corpus path, `data/incidents.ndjson`.
#[must_use]
pub fn default_corpus_path() -> PathBuf {
    data_dir().join("incidents.ndjson")
}

/// Returns the default artifact directory, `data/models/`.
#[must_use]
pub fn default_artifacts_dir() -> PathBuf {
    data_dir().join("models")
}

/// Corpus path from [`DATA_PATH_ENV`], falling back to
/// [`default_corpus_path`].
#[must_use]
pub fn corpus_path_from_env() -> PathBuf {
    std::env::var(DATA_PATH_ENV).map_or_else(|_| default_corpus_path(), PathBuf::from)
}

/// Artifact directory from [`ARTIFACTS_DIR_ENV`], falling back to
/// [`default_artifacts_dir`].
#[must_use]
pub fn artifacts_dir_from_env() -> PathBuf {
    std::env::var(ARTIFACTS_DIR_ENV).map_or_else(|_| default_artifacts_dir(), PathBuf::from)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

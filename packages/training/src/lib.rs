#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Training pipeline for the incident models.
//!
//! Reads the whole corpus, extracts features and targets, fits the three
//! encoders, trains the four models one after another and only then
//! writes the seven artifacts. Any failure aborts the run before anything
//! is persisted.

pub mod artifacts;
pub mod config;
pub mod interactive;
pub mod pipeline;

use std::path::PathBuf;

use incident_predict_boost::BoostError;
use incident_predict_features::{EncodingError, ExtractionError};
use incident_predict_store::StoreError;
use thiserror::Error;

pub use artifacts::{ArtifactIoError, ArtifactSet, ModelKind};
pub use config::TrainingConfig;
pub use pipeline::{run, run_and_save, train_models};

/// Errors that abort a training run.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// The corpus could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A document is missing a field or holds a malformed value.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// A value could not be encoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// A model failed to train.
    #[error("failed to train the {} model: {source}", model.label())]
    Training {
        /// Which model failed.
        model: ModelKind,
        /// Learner error.
        #[source]
        source: BoostError,
    },

    /// An artifact could not be written or read.
    #[error("artifact {}: {source}", path.display())]
    Persistence {
        /// Offending file or directory.
        path: PathBuf,
        /// Underlying I/O or JSON error.
        #[source]
        source: ArtifactIoError,
    },

    /// The training configuration is invalid.
    #[error("invalid training config: {0}")]
    Config(String),
}

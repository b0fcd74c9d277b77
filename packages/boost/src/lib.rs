#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Gradient boosting over `smartcore` regression trees.
//!
//! Each round fits one [`smartcore`] decision-tree regressor per margin to
//! the pseudo-residuals of the loss and adds its output, scaled by the
//! learning rate, to that margin. Three objectives are supported:
//!
//! * squared error, via [`Regressor`]
//! * logistic loss for two classes, via [`Classifier`]
//! * softmax loss for more than two classes, via [`Classifier`]
//!
//! Feature importances are permutation importances, measured once on the
//! training rows when fitting finishes.
//!
//! A model only exists once [`Regressor::fit`] or [`Classifier::fit`] has
//! returned successfully; there is no incremental update. Given the same
//! data and [`BoostConfig`] (including its seed) training is fully
//! deterministic. Deserialized models are checked for internal consistency
//! before they are handed out.

pub mod booster;
pub mod config;
pub mod objective;

pub use booster::{Classifier, Regressor};
pub use config::BoostConfig;
pub use objective::Objective;

use thiserror::Error;

/// Errors raised while training or evaluating a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoostError {
    /// The training set has no rows.
    #[error("cannot train on an empty dataset")]
    EmptyDataset,

    /// The target has a different number of rows than the feature matrix.
    #[error("feature matrix has {rows} rows but target has {targets}")]
    LengthMismatch {
        /// Feature matrix row count.
        rows: usize,
        /// Target length.
        targets: usize,
    },

    /// A classification target holds fewer than two distinct classes.
    #[error("degenerate target: {distinct} distinct class(es), at least 2 required")]
    DegenerateTarget {
        /// Number of distinct classes observed.
        distinct: usize,
    },

    /// A class label is outside `0..num_classes`.
    #[error("label {label} is outside 0..{num_classes}")]
    InvalidLabel {
        /// The offending label.
        label: u32,
        /// Declared number of classes.
        num_classes: usize,
    },

    /// A feature or target value is NaN or infinite.
    #[error("non-finite value in {what} at row {row}")]
    NonFinite {
        /// `"features"` or `"target"`.
        what: &'static str,
        /// 0-based row index.
        row: usize,
    },

    /// A prediction input has the wrong number of features.
    #[error("expected {expected} features, got {actual}")]
    FeatureCountMismatch {
        /// Features the model was trained on.
        expected: usize,
        /// Features supplied.
        actual: usize,
    },

    /// A hyper-parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The underlying tree learner failed.
    #[error("tree learner failed: {0}")]
    Learner(String),
}

impl From<smartcore::error::Failed> for BoostError {
    fn from(e: smartcore::error::Failed) -> Self {
        Self::Learner(e.to_string())
    }
}

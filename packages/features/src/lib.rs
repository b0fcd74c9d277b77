#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Feature engineering for the incident models.
//!
//! Turns raw incident documents into [`ExtractedRow`]s, fits the three
//! categorical [`LabelEncoder`]s, and assembles the [`TrainingTable`] that
//! every model is trained on. The input schema is the named
//! [`FeatureRow`]; its column order is defined in one place by
//! [`Feature::all`] and used both at training and at inference time.

pub mod encoder;
pub mod extract;
pub mod schema;
pub mod table;

pub use encoder::{EncoderKind, EncodingError, LabelEncoder};
pub use extract::{ExtractedRow, ExtractionError, extract_all, extract_row};
pub use schema::{FEATURE_COUNT, Feature, FeatureRow};
pub use table::{Encoders, TrainingTable};

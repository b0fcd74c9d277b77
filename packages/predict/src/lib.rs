#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Single-record inference.
//!
//! A [`Predictor`] wraps a loaded [`ArtifactSet`] and turns a
//! [`PredictionInput`] (region, initial report, timestamp) into a
//! [`Prediction`] with display-ready values: integer casualties and
//! minutes, percentages rounded to one decimal.

use std::path::Path;

use chrono::NaiveDateTime;
use incident_predict_boost::BoostError;
use incident_predict_features::extract::parse_timestamp;
use incident_predict_features::{EncodingError, Feature};
use incident_predict_training::{ArtifactSet, ModelKind, TrainingError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timestamp format of an HTML `datetime-local` input.
const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Errors raised while predicting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    /// The region or report was not seen during training.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The timestamp could not be parsed.
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    /// A model rejected the input.
    #[error("model error: {0}")]
    Model(String),
}

impl From<BoostError> for PredictError {
    fn from(e: BoostError) -> Self {
        Self::Model(e.to_string())
    }
}

/// One record to predict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionInput {
    /// Operational region, e.g. `"RMR"`.
    pub region: String,
    /// Initial report text.
    pub report: String,
    /// When the incident occurred.
    pub occurred_at: NaiveDateTime,
}

impl PredictionInput {
    /// Builds an input from a raw timestamp string.
    ///
    /// Accepts `YYYY-MM-DDTHH:MM` as well as every format the corpus
    /// accepts.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::InvalidTimestamp`] if `occurred_at` matches
    /// none of them.
    pub fn parse(region: &str, report: &str, occurred_at: &str) -> Result<Self, PredictError> {
        let occurred_at = parse_occurred_at(occurred_at)
            .ok_or_else(|| PredictError::InvalidTimestamp(occurred_at.to_string()))?;
        Ok(Self {
            region: region.to_string(),
            report: report.to_string(),
            occurred_at,
        })
    }
}

fn parse_occurred_at(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, MINUTE_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(s))
}

/// A label with a percentage value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledPercent {
    /// Display label.
    pub label: String,
    /// Percentage, rounded to one decimal.
    pub value: f64,
}

/// Model outputs for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Most likely incident group.
    pub incident_group: String,
    /// Probability of every group, most likely first.
    pub group_probabilities: Vec<LabeledPercent>,
    /// Expected casualties, rounded and never negative.
    pub casualties: u32,
    /// Raw casualty estimate, rounded to two decimals.
    pub casualties_raw: f64,
    /// Expected response time in minutes, rounded and at least 1.
    pub response_minutes: u32,
    /// Mass-casualty probability in percent.
    pub mass_casualty_risk: f64,
}

/// Rounds to `decimals` decimal places.
fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// `max(0, round(raw))`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_casualties(raw: f64) -> u32 {
    raw.round().max(0.0) as u32
}

/// `max(1, round(raw))`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_minutes(raw: f64) -> u32 {
    raw.round().max(1.0) as u32
}

fn percent(p: f64) -> f64 {
    round_to(p * 100.0, 1)
}

fn sort_descending(values: &mut [LabeledPercent]) {
    values.sort_by(|a, b| b.value.total_cmp(&a.value));
}

/// Loaded models and encoders, ready to predict.
#[derive(Debug)]
pub struct Predictor {
    artifacts: ArtifactSet,
}

impl Predictor {
    /// Wraps an already loaded artifact set.
    #[must_use]
    pub const fn new(artifacts: ArtifactSet) -> Self {
        Self { artifacts }
    }

    /// Loads the artifacts from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Persistence`] if any artifact is missing,
    /// unreadable, or inconsistent with the others.
    pub fn load(dir: &Path) -> Result<Self, TrainingError> {
        Ok(Self::new(ArtifactSet::load(dir)?))
    }

    /// The underlying artifacts.
    #[must_use]
    pub const fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// Runs all four models on one record.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::Encoding`] if the region or report is
    /// unknown, and [`PredictError::Model`] if a model's output does not
    /// match the encoders.
    pub fn predict(&self, input: &PredictionInput) -> Result<Prediction, PredictError> {
        let encoders = &self.artifacts.encoders;
        let row = encoders
            .encode_features(&input.region, input.occurred_at, &input.report)?
            .to_values();

        let model = &self.artifacts.incident_group;
        let probabilities = model.predict_proba(&row)?;
        if probabilities.len() != encoders.group.len() {
            return Err(PredictError::Model(format!(
                "incident group model returned {} probabilities for {} groups",
                probabilities.len(),
                encoders.group.len()
            )));
        }
        let class = u32::try_from(model.predict_class(&row)?)
            .map_err(|e| PredictError::Model(e.to_string()))?;
        let incident_group = encoders.group.decode(class)?.to_string();

        let mut group_probabilities: Vec<LabeledPercent> = encoders
            .group
            .classes()
            .iter()
            .zip(&probabilities)
            .map(|(label, &p)| LabeledPercent {
                label: label.clone(),
                value: percent(p),
            })
            .collect();
        sort_descending(&mut group_probabilities);

        let casualties_raw = self.artifacts.casualties.predict(&row)?;
        let minutes_raw = self.artifacts.response_time.predict(&row)?;
        let risk = self
            .artifacts
            .mass_casualty
            .predict_proba(&row)?
            .get(1)
            .copied()
            .ok_or_else(|| {
                PredictError::Model("mass casualty model has no positive class".to_string())
            })?;

        log::debug!(
            "Predicted {incident_group} for {} / {} at {}",
            input.region,
            input.report,
            input.occurred_at
        );

        Ok(Prediction {
            incident_group,
            group_probabilities,
            casualties: clamp_casualties(casualties_raw),
            casualties_raw: round_to(casualties_raw, 2),
            response_minutes: clamp_minutes(minutes_raw),
            mass_casualty_risk: percent(risk),
        })
    }

    /// Feature importances of `model` as percentages, highest first.
    #[must_use]
    pub fn feature_factors(&self, model: ModelKind) -> Vec<LabeledPercent> {
        let importances = match model {
            ModelKind::IncidentGroup => self.artifacts.incident_group.feature_importances(),
            ModelKind::Casualties => self.artifacts.casualties.feature_importances(),
            ModelKind::ResponseTime => self.artifacts.response_time.feature_importances(),
            ModelKind::MassCasualty => self.artifacts.mass_casualty.feature_importances(),
        };

        let mut factors: Vec<LabeledPercent> = Feature::all()
            .iter()
            .zip(importances)
            .map(|(feature, importance)| LabeledPercent {
                label: feature.label().to_string(),
                value: percent(importance),
            })
            .collect();
        sort_descending(&mut factors);
        factors
    }

    /// Regions accepted by [`Self::predict`].
    #[must_use]
    pub fn region_options(&self) -> &[String] {
        self.artifacts.encoders.region.classes()
    }

    /// Initial reports accepted by [`Self::predict`].
    #[must_use]
    pub fn report_options(&self) -> &[String] {
        self.artifacts.encoders.report.classes()
    }
}

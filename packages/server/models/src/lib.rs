#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the incident predict server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the store and predictor types so the API contract can evolve on
//! its own.

use chrono::NaiveDateTime;
use incident_predict_incident_models::IncidentDocument;
use incident_predict_predict::{LabeledPercent, Prediction};
use incident_predict_store::queries::{DashboardSummary, KeyCount, LevelCount};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the process is up.
    pub healthy: bool,
    /// Whether the corpus and models are loaded.
    pub ready: bool,
    /// Why the service is not ready, if it is not.
    pub reason: Option<String>,
    /// Service version.
    pub version: String,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Wraps any displayable error.
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

/// Query parameters for `GET /api/dashboard`. `"All"` or a missing value
/// disables a filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQueryParams {
    /// Calendar year.
    pub year: Option<String>,
    /// Incident group label.
    pub group: Option<String>,
    /// Mass-casualty level.
    pub level: Option<String>,
    /// Operational region code.
    pub region: Option<String>,
}

/// A labelled count in a chart series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCount {
    /// Category label.
    pub label: String,
    /// Number of incidents.
    pub count: u64,
}

impl From<KeyCount> for ApiCount {
    fn from(value: KeyCount) -> Self {
        Self {
            label: value.key,
            count: value.count,
        }
    }
}

impl From<LevelCount> for ApiCount {
    fn from(value: LevelCount) -> Self {
        Self {
            label: value.level.to_string(),
            count: value.count,
        }
    }
}

/// An incident row in the dashboard's latest-incidents table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIncident {
    /// Dispatch notice number.
    pub notice_number: String,
    /// When the incident occurred.
    pub occurred_at: NaiveDateTime,
    /// Operational region code.
    pub region: String,
    /// Municipality.
    pub municipality: String,
    /// Incident group label.
    pub group: String,
    /// Initial report text.
    pub initial_report: String,
    /// Number of casualties.
    pub casualties: u32,
    /// Mass-casualty level.
    pub level: u8,
}

impl From<IncidentDocument> for ApiIncident {
    fn from(doc: IncidentDocument) -> Self {
        Self {
            notice_number: doc.notice_number,
            occurred_at: doc.occurred_at,
            region: doc.operational_region,
            municipality: doc.address.municipality,
            group: doc.nature.group,
            initial_report: doc.nature.initial_report,
            casualties: doc.mass_casualty.casualties,
            level: doc.mass_casualty.level,
        }
    }
}

/// Response of `GET /api/dashboard`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDashboard {
    /// Matching incidents.
    pub total: u64,
    /// Casualties over matching incidents.
    pub total_casualties: u64,
    /// Counts per region, most frequent first.
    pub by_region: Vec<ApiCount>,
    /// Counts per group, most frequent first.
    pub by_group: Vec<ApiCount>,
    /// Counts per mass-casualty level, ascending.
    pub by_level: Vec<ApiCount>,
    /// Most recent matching incidents.
    pub latest: Vec<ApiIncident>,
    /// Years available for filtering, newest first.
    pub years: Vec<i32>,
    /// Groups available for filtering.
    pub groups: Vec<String>,
    /// Regions available for filtering.
    pub regions: Vec<String>,
}

impl From<DashboardSummary> for ApiDashboard {
    fn from(summary: DashboardSummary) -> Self {
        Self {
            total: summary.total,
            total_casualties: summary.total_casualties,
            by_region: summary.by_region.into_iter().map(ApiCount::from).collect(),
            by_group: summary.by_group.into_iter().map(ApiCount::from).collect(),
            by_level: summary.by_level.into_iter().map(ApiCount::from).collect(),
            latest: summary.latest.into_iter().map(ApiIncident::from).collect(),
            years: summary.years,
            groups: summary.groups,
            regions: summary.regions,
        }
    }
}

/// Parallel label/value arrays, ready for a chart library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiChart {
    /// Series labels.
    pub labels: Vec<String>,
    /// Series values (percentages).
    pub data: Vec<f64>,
}

impl From<Vec<LabeledPercent>> for ApiChart {
    fn from(values: Vec<LabeledPercent>) -> Self {
        let (labels, data) = values.into_iter().map(|v| (v.label, v.value)).unzip();
        Self { labels, data }
    }
}

/// Response of `GET /api/prediction/options`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPredictionOptions {
    /// Regions the models know.
    pub regions: Vec<String>,
    /// Initial reports the models know.
    pub reports: Vec<String>,
    /// Feature importances of the incident group model.
    pub group_factors: ApiChart,
    /// Feature importances of the casualty model.
    pub casualty_factors: ApiChart,
}

/// Body of `POST /api/prediction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    /// Operational region code.
    pub region: String,
    /// Initial report text.
    pub report: String,
    /// Occurrence time, `YYYY-MM-DDTHH:MM` or with seconds.
    pub occurred_at: String,
}

/// Response of `POST /api/prediction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPrediction {
    /// Most likely incident group.
    pub incident_group: String,
    /// Group probabilities in percent, most likely first.
    pub group_probabilities: ApiChart,
    /// Expected casualties.
    pub casualties: u32,
    /// Unrounded casualty estimate (two decimals).
    pub casualties_raw: f64,
    /// Expected response time in minutes.
    pub response_minutes: u32,
    /// Mass-casualty risk in percent.
    pub mass_casualty_risk: f64,
}

impl From<Prediction> for ApiPrediction {
    fn from(p: Prediction) -> Self {
        Self {
            incident_group: p.incident_group,
            group_probabilities: p.group_probabilities.into(),
            casualties: p.casualties,
            casualties_raw: p.casualties_raw,
            response_minutes: p.response_minutes,
            mass_casualty_risk: p.mass_casualty_risk,
        }
    }
}

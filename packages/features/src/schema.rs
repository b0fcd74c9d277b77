//! The model input schema.

use chrono::{Datelike as _, NaiveDateTime, Timelike as _};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Number of model input features.
pub const FEATURE_COUNT: usize = 4;

/// A named model input feature.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Feature {
    /// Encoded operational region.
    Region,
    /// Hour of day of the occurrence, 0-23.
    Hour,
    /// Day of week of the occurrence, Monday = 0.
    Weekday,
    /// Encoded initial report text.
    Report,
}

impl Feature {
    /// All features in model column order.
    #[must_use]
    pub const fn all() -> &'static [Self; FEATURE_COUNT] {
        &[Self::Region, Self::Hour, Self::Weekday, Self::Report]
    }

    /// Column index of this feature in the model input.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable label for charts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Region => "Region",
            Self::Hour => "Time of day",
            Self::Weekday => "Day of week",
            Self::Report => "Initial report",
        }
    }
}

/// One encoded model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Region code from the region encoder.
    pub region_code: u32,
    /// Hour of day, 0-23.
    pub hour_of_day: u32,
    /// Day of week, Monday = 0.
    pub weekday: u32,
    /// Report code from the report encoder.
    pub report_code: u32,
}

impl FeatureRow {
    /// Builds a row from already-encoded categorical codes and an
    /// occurrence timestamp.
    #[must_use]
    pub fn new(region_code: u32, occurred_at: NaiveDateTime, report_code: u32) -> Self {
        Self {
            region_code,
            hour_of_day: occurred_at.hour(),
            weekday: occurred_at.weekday().num_days_from_monday(),
            report_code,
        }
    }

    /// Value of a single feature.
    #[must_use]
    pub const fn get(&self, feature: Feature) -> u32 {
        match feature {
            Feature::Region => self.region_code,
            Feature::Hour => self.hour_of_day,
            Feature::Weekday => self.weekday,
            Feature::Report => self.report_code,
        }
    }

    /// Values in model column order.
    #[must_use]
    pub fn to_values(&self) -> [f64; FEATURE_COUNT] {
        let columns = *Feature::all();
        columns.map(|f| f64::from(self.get(f)))
    }
}

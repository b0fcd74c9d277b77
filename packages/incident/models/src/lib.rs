#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Emergency-response incident document types and the incident group
//! taxonomy.
//!
//! An [`IncidentDocument`] is the unit stored in the document store: one
//! dispatched call with its region, occurrence time, initial report, the
//! group it was eventually classified into, its status timestamps and its
//! casualty tally. The generator writes these, the dashboard reads them,
//! and the training pipeline extracts features from their raw JSON form.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Casualty count at or above which an incident is a mass-casualty event.
pub const MASS_CASUALTY_THRESHOLD: u32 = 5;

/// Casualty count above which a mass-casualty event is escalated to the
/// highest severity level.
pub const SEVERE_MASS_CASUALTY_THRESHOLD: u32 = 10;

/// Returns `true` when `casualties` meets the mass-casualty threshold.
#[must_use]
pub const fn is_mass_casualty(casualties: u32) -> bool {
    casualties >= MASS_CASUALTY_THRESHOLD
}

/// Mass-casualty severity level: 0 (none), 1 (mass casualty), 2 (severe).
#[must_use]
pub const fn mass_casualty_level(casualties: u32) -> u8 {
    if casualties > SEVERE_MASS_CASUALTY_THRESHOLD {
        2
    } else if is_mass_casualty(casualties) {
        1
    } else {
        0
    }
}

/// Operational regions covered by the fire brigade.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationalRegion {
    /// Metropolitan region around the capital.
    #[serde(rename = "RMR")]
    #[strum(serialize = "RMR")]
    Metropolitan,
    /// Transition zone between the coast and the semi-arid interior.
    Agreste,
    /// Semi-arid interior.
    Sertao,
    /// Coastal forest zone.
    Mata,
}

impl OperationalRegion {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Metropolitan, Self::Agreste, Self::Sertao, Self::Mata]
    }
}

/// Incident groups an incident is classified into after dispatch.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentGroup {
    /// Pre-hospital care (traffic collisions, falls, sudden illness)
    PreHospitalCare,
    /// Vegetation, building and vehicle fires
    Fire,
    /// Rescues (elevators, drowning, collapses, animals)
    Rescue,
    /// Gas leaks, chemical and oil spills
    HazardousMaterials,
    /// Event inspections and preventive patrols
    Prevention,
    /// Talks, drills and other community work
    CommunityActivity,
}

impl IncidentGroup {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::PreHospitalCare,
            Self::Fire,
            Self::Rescue,
            Self::HazardousMaterials,
            Self::Prevention,
            Self::CommunityActivity,
        ]
    }
}

/// Nature of the call: what the caller reported and how it was classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nature {
    /// Free-form initial report text (drawn from a closed list).
    pub initial_report: String,
    /// Incident group label.
    pub group: String,
}

/// Where the incident happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Municipality name.
    pub municipality: String,
    /// Neighborhood name.
    pub neighborhood: String,
}

/// Status timestamps recorded by the dispatch center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTimes {
    /// H1: call received.
    pub h1_receipt: NaiveDateTime,
    /// H4: crew arrived on scene.
    pub h4_arrival: NaiveDateTime,
}

impl StatusTimes {
    /// Minutes between receipt and arrival. Negative when the timestamps
    /// are out of order.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn response_minutes(&self) -> f64 {
        let elapsed = self.h4_arrival - self.h1_receipt;
        elapsed.num_microseconds().map_or_else(
            || elapsed.num_milliseconds() as f64 / 60_000.0,
            |micros| micros as f64 / 60_000_000.0,
        )
    }
}

/// Casualty tally and derived severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MassCasualty {
    /// Severity level (see [`mass_casualty_level`]).
    pub level: u8,
    /// Number of casualties.
    pub casualties: u32,
}

impl MassCasualty {
    /// Builds a tally with the level derived from `casualties`.
    #[must_use]
    pub const fn from_casualties(casualties: u32) -> Self {
        Self {
            level: mass_casualty_level(casualties),
            casualties,
        }
    }
}

/// A stored emergency-response incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentDocument {
    /// Dispatch notice number (e.g. `AV-01234567`).
    pub notice_number: String,
    /// When the incident occurred (naive local time).
    pub occurred_at: NaiveDateTime,
    /// Calendar year of `occurred_at`, denormalized for filtering.
    pub year: i32,
    /// Operational region code.
    pub operational_region: String,
    /// Reported and classified nature.
    pub nature: Nature,
    /// Location.
    pub address: Address,
    /// Dispatch status timestamps.
    pub status_times: StatusTimes,
    /// Casualty tally.
    pub mass_casualty: MassCasualty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn mass_casualty_levels() {
        assert_eq!(mass_casualty_level(0), 0);
        assert_eq!(mass_casualty_level(4), 0);
        assert_eq!(mass_casualty_level(5), 1);
        assert_eq!(mass_casualty_level(10), 1);
        assert_eq!(mass_casualty_level(11), 2);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(!is_mass_casualty(4));
        assert!(is_mass_casualty(5));
    }

    #[test]
    fn response_minutes_between_status_times() {
        let times = StatusTimes {
            h1_receipt: at(10, 0),
            h4_arrival: at(10, 7),
        };
        assert!((times.response_minutes() - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn response_minutes_can_be_negative() {
        let times = StatusTimes {
            h1_receipt: at(10, 7),
            h4_arrival: at(10, 0),
        };
        assert!((times.response_minutes() + 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn response_minutes_keeps_sub_millisecond_precision() {
        let times = StatusTimes {
            h1_receipt: at(10, 0),
            h4_arrival: at(10, 0) + chrono::Duration::microseconds(600),
        };
        assert!((times.response_minutes() - 0.000_01).abs() < 1e-12);
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn response_minutes_falls_back_to_milliseconds_on_overflow() {
        let times = StatusTimes {
            h1_receipt: NaiveDateTime::MIN,
            h4_arrival: NaiveDateTime::MAX,
        };
        let elapsed = times.h4_arrival - times.h1_receipt;
        assert!(elapsed.num_microseconds().is_none());

        let expected = elapsed.num_milliseconds() as f64 / 60_000.0;
        assert!((times.response_minutes() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn region_codes_round_trip_through_strum() {
        assert_eq!(OperationalRegion::Metropolitan.to_string(), "RMR");
        assert_eq!(OperationalRegion::Sertao.as_ref(), "SERTAO");
        assert_eq!(
            "RMR".parse::<OperationalRegion>().unwrap(),
            OperationalRegion::Metropolitan
        );
    }

    #[test]
    fn group_labels_are_screaming_snake_case() {
        assert_eq!(IncidentGroup::PreHospitalCare.as_ref(), "PRE_HOSPITAL_CARE");
        assert_eq!(
            serde_json::to_string(&IncidentGroup::HazardousMaterials).unwrap(),
            "\"HAZARDOUS_MATERIALS\""
        );
    }

    #[test]
    fn document_serializes_with_naive_timestamps() {
        let doc = IncidentDocument {
            notice_number: "AV-00000001".to_string(),
            occurred_at: at(14, 5),
            year: 2024,
            operational_region: "RMR".to_string(),
            nature: Nature {
                initial_report: "Pedestrian struck".to_string(),
                group: "PRE_HOSPITAL_CARE".to_string(),
            },
            address: Address {
                municipality: "Recife".to_string(),
                neighborhood: "Centro".to_string(),
            },
            status_times: StatusTimes {
                h1_receipt: at(14, 5),
                h4_arrival: at(14, 30),
            },
            mass_casualty: MassCasualty::from_casualties(2),
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["occurred_at"], "2024-03-05T14:05:00");
        assert_eq!(json["nature"]["group"], "PRE_HOSPITAL_CARE");
        assert_eq!(json["mass_casualty"]["level"], 0);

        let back: IncidentDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }
}

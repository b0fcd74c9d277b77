//! Sampling tables for the synthetic corpus.
//!
//! Everything the generator draws from lives here as data: locations,
//! report texts, base group weights, the correlation rules that override
//! them, and casualty distributions.

use std::ops::RangeInclusive;

use incident_predict_incident_models::{IncidentGroup, OperationalRegion};

/// A place incidents can happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Municipality name.
    pub municipality: &'static str,
    /// Neighborhood name.
    pub neighborhood: &'static str,
    /// Operational region the municipality belongs to.
    pub region: OperationalRegion,
}

/// Locations, sampled uniformly.
pub const LOCATIONS: &[Location] = &[
    Location {
        municipality: "Recife",
        neighborhood: "Boa Viagem",
        region: OperationalRegion::Metropolitan,
    },
    Location {
        municipality: "Recife",
        neighborhood: "Casa Amarela",
        region: OperationalRegion::Metropolitan,
    },
    Location {
        municipality: "Olinda",
        neighborhood: "Rio Doce",
        region: OperationalRegion::Metropolitan,
    },
    Location {
        municipality: "Jaboatao",
        neighborhood: "Prazeres",
        region: OperationalRegion::Metropolitan,
    },
    Location {
        municipality: "Caruaru",
        neighborhood: "Centro",
        region: OperationalRegion::Agreste,
    },
    Location {
        municipality: "Petrolina",
        neighborhood: "Centro",
        region: OperationalRegion::Sertao,
    },
    Location {
        municipality: "Serra Talhada",
        neighborhood: "Bom Jesus",
        region: OperationalRegion::Sertao,
    },
    Location {
        municipality: "Palmares",
        neighborhood: "Centro",
        region: OperationalRegion::Mata,
    },
];

/// Reports that say little about the eventual group.
pub const AMBIGUOUS_REPORTS: &[&str] = &[
    "Inspection request",
    "Residents report a loud bang",
    "Strong smell at the scene",
    "Smoke seen from afar",
    "Call for help via 193",
    "Animal at risk",
    "Incident on a public road",
    "Structure collapse",
    "Unidentified leak",
];

/// Reports that point at a specific group.
#[must_use]
pub const fn specific_reports(group: IncidentGroup) -> &'static [&'static str] {
    match group {
        IncidentGroup::PreHospitalCare => &[
            "Motorcycle and car collision",
            "Pedestrian struck",
            "Fall from standing height",
            "Sudden illness on the street",
        ],
        IncidentGroup::Fire => &[
            "Vegetation fire",
            "Flames in a building",
            "Vehicle fire",
            "Incipient fire",
        ],
        IncidentGroup::Rescue => &[
            "Person trapped in elevator",
            "Drowning",
            "Cat in a tree",
            "Building collapse",
        ],
        IncidentGroup::HazardousMaterials => &["LPG leak", "Oil spill", "Ammonia smell"],
        IncidentGroup::Prevention => &["Event inspection", "Beach prevention patrol"],
        IncidentGroup::CommunityActivity => &["Educational talk", "Evacuation drill"],
    }
}

/// Group weights used when no correlation rule applies.
pub const BASE_GROUP_WEIGHTS: &[(IncidentGroup, u32)] = &[
    (IncidentGroup::PreHospitalCare, 40),
    (IncidentGroup::Fire, 20),
    (IncidentGroup::Rescue, 20),
    (IncidentGroup::HazardousMaterials, 5),
    (IncidentGroup::Prevention, 10),
    (IncidentGroup::CommunityActivity, 5),
];

/// Forces a group for a region and time window.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationRule {
    /// Region the rule applies to.
    pub region: OperationalRegion,
    /// Hours of day (inclusive ranges) the rule applies to.
    pub hours: &'static [RangeInclusive<u32>],
    /// The rule only applies in months strictly after this one (0 = all year).
    pub after_month: u32,
    /// Group assigned when the rule applies.
    pub group: IncidentGroup,
    /// Chance the report is drawn from [`AMBIGUOUS_REPORTS`] instead of the
    /// group's specific reports.
    pub ambiguous_probability: f64,
}

impl CorrelationRule {
    /// Whether the rule applies to an incident.
    #[must_use]
    pub fn matches(&self, region: OperationalRegion, hour: u32, month: u32) -> bool {
        region == self.region
            && month > self.after_month
            && self.hours.iter().any(|range| range.contains(&hour))
    }
}

/// Correlation rules, checked in order; the first match wins.
pub const CORRELATION_RULES: &[CorrelationRule] = &[
    // Afternoon vegetation fires in the dry season.
    CorrelationRule {
        region: OperationalRegion::Sertao,
        hours: &[12..=16],
        after_month: 8,
        group: IncidentGroup::Fire,
        ambiguous_probability: 0.5,
    },
    // Rush-hour traffic.
    CorrelationRule {
        region: OperationalRegion::Metropolitan,
        hours: &[7..=9, 17..=19],
        after_month: 0,
        group: IncidentGroup::PreHospitalCare,
        ambiguous_probability: 0.4,
    },
];

/// First rule matching an incident, if any.
#[must_use]
pub fn matching_rule(
    region: OperationalRegion,
    hour: u32,
    month: u32,
) -> Option<&'static CorrelationRule> {
    CORRELATION_RULES
        .iter()
        .find(|rule| rule.matches(region, hour, month))
}

/// Casualty counts for pre-hospital care, with weights.
pub const PRE_HOSPITAL_CASUALTY_WEIGHTS: &[(u32, u32)] = &[(1, 70), (2, 20), (5, 10)];

/// Chance a fire has casualties.
pub const FIRE_CASUALTY_PROBABILITY: f64 = 0.2;

/// Casualty count range for fires with casualties.
pub const FIRE_CASUALTIES: RangeInclusive<u32> = 1..=3;

/// Minutes from receipt to dispatch.
pub const DISPATCH_MINUTES: RangeInclusive<i64> = 1..=5;

/// Minutes of travel from dispatch to arrival.
pub const TRAVEL_MINUTES: RangeInclusive<i64> = 5..=45;

/// How far back occurrence timestamps reach.
pub const HISTORY_DAYS: i64 = 5 * 365;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_group_has_reports_and_a_weight() {
        for &group in IncidentGroup::all() {
            assert!(!specific_reports(group).is_empty(), "{group}");
            assert!(BASE_GROUP_WEIGHTS.iter().any(|(g, w)| *g == group && *w > 0));
        }
    }

    #[test]
    fn dry_season_rule_needs_all_three_conditions() {
        let s = OperationalRegion::Sertao;
        assert_eq!(matching_rule(s, 14, 9).map(|r| r.group), Some(IncidentGroup::Fire));
        assert!(matching_rule(s, 14, 8).is_none());
        assert!(matching_rule(s, 17, 10).is_none());
        assert!(matching_rule(OperationalRegion::Agreste, 14, 10).is_none());
    }

    #[test]
    fn rush_hour_rule_covers_both_windows() {
        let rmr = OperationalRegion::Metropolitan;
        for hour in [7, 9, 17, 19] {
            assert_eq!(
                matching_rule(rmr, hour, 1).map(|r| r.group),
                Some(IncidentGroup::PreHospitalCare)
            );
        }
        for hour in [6, 10, 16, 20] {
            assert!(matching_rule(rmr, hour, 1).is_none());
        }
    }

    #[test]
    fn reports_do_not_overlap_across_groups() {
        let mut all: Vec<&str> = IncidentGroup::all()
            .iter()
            .flat_map(|&g| specific_reports(g).iter().copied())
            .chain(AMBIGUOUS_REPORTS.iter().copied())
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}

//! Dashboard aggregation queries over incident documents.
//!
//! Mirrors the aggregations the dashboard needs: a filtered total, the
//! casualty sum, per-region/per-group/per-level breakdowns, the most recent
//! incidents, and the distinct values that populate the filter dropdowns.

use std::collections::{BTreeMap, BTreeSet};

use incident_predict_incident_models::IncidentDocument;
use serde::{Deserialize, Serialize};

/// Filter value meaning "do not filter on this field".
pub const ALL_FILTER: &str = "All";

/// Number of incidents returned in [`DashboardSummary::latest`].
pub const LATEST_LIMIT: usize = 10;

/// Error returned when a numeric filter value cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field} filter '{value}'")]
pub struct InvalidFilterError {
    /// Name of the filter field.
    pub field: &'static str,
    /// The rejected value.
    pub value: String,
}

/// Dashboard filters. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardFilter {
    /// Calendar year.
    pub year: Option<i32>,
    /// Incident group label.
    pub group: Option<String>,
    /// Mass-casualty level.
    pub level: Option<u8>,
    /// Operational region code.
    pub region: Option<String>,
}

/// Treats a missing, blank, or [`ALL_FILTER`] value as "no filter".
fn choice(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL_FILTER))
}

impl DashboardFilter {
    /// Builds a filter from raw query-string values.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFilterError`] if `year` or `level` is present but
    /// not a number.
    pub fn parse(
        year: Option<&str>,
        group: Option<&str>,
        level: Option<&str>,
        region: Option<&str>,
    ) -> Result<Self, InvalidFilterError> {
        let year = choice(year)
            .map(|v| {
                v.parse().map_err(|_| InvalidFilterError {
                    field: "year",
                    value: v.to_string(),
                })
            })
            .transpose()?;
        let level = choice(level)
            .map(|v| {
                v.parse().map_err(|_| InvalidFilterError {
                    field: "level",
                    value: v.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            year,
            group: choice(group).map(str::to_string),
            level,
            region: choice(region).map(str::to_string),
        })
    }

    /// Returns `true` if `incident` passes every active filter.
    #[must_use]
    pub fn matches(&self, incident: &IncidentDocument) -> bool {
        self.year.is_none_or(|y| incident.year == y)
            && self
                .group
                .as_deref()
                .is_none_or(|g| incident.nature.group == g)
            && self
                .level
                .is_none_or(|l| incident.mass_casualty.level == l)
            && self
                .region
                .as_deref()
                .is_none_or(|r| incident.operational_region == r)
    }
}

/// Incident count for one category value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCount {
    /// Category value (region code or group label).
    pub key: String,
    /// Number of matching incidents.
    pub count: u64,
}

/// Incident count for one mass-casualty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCount {
    /// Mass-casualty level.
    pub level: u8,
    /// Number of matching incidents.
    pub count: u64,
}

/// Aggregated dashboard data for one filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Incidents matching the filter.
    pub total: u64,
    /// Sum of casualties over matching incidents.
    pub total_casualties: u64,
    /// Counts per region, most frequent first.
    pub by_region: Vec<KeyCount>,
    /// Counts per incident group, most frequent first.
    pub by_group: Vec<KeyCount>,
    /// Counts per mass-casualty level, ascending by level.
    pub by_level: Vec<LevelCount>,
    /// Most recent matching incidents, newest first.
    pub latest: Vec<IncidentDocument>,
    /// Every year present in the corpus, newest first.
    pub years: Vec<i32>,
    /// Every group label present in the corpus, sorted.
    pub groups: Vec<String>,
    /// Every region code present in the corpus, sorted.
    pub regions: Vec<String>,
}

/// Sorts counts descending, breaking ties by key so output is stable.
fn ranked(counts: BTreeMap<&str, u64>) -> Vec<KeyCount> {
    let mut ranked: Vec<KeyCount> = counts
        .into_iter()
        .map(|(key, count)| KeyCount {
            key: key.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    ranked
}

/// Computes the dashboard aggregations for `filter`.
///
/// The distinct `years`, `groups` and `regions` lists are computed over the
/// whole corpus so the filter dropdowns never shrink.
#[must_use]
pub fn summarize(incidents: &[IncidentDocument], filter: &DashboardFilter) -> DashboardSummary {
    let matching: Vec<&IncidentDocument> = incidents.iter().filter(|i| filter.matches(i)).collect();

    let mut by_region: BTreeMap<&str, u64> = BTreeMap::new();
    let mut by_group: BTreeMap<&str, u64> = BTreeMap::new();
    let mut by_level: BTreeMap<u8, u64> = BTreeMap::new();
    let mut total_casualties = 0u64;

    for incident in &matching {
        *by_region.entry(&incident.operational_region).or_default() += 1;
        *by_group.entry(&incident.nature.group).or_default() += 1;
        *by_level.entry(incident.mass_casualty.level).or_default() += 1;
        total_casualties += u64::from(incident.mass_casualty.casualties);
    }

    let mut latest: Vec<&IncidentDocument> = matching.clone();
    latest.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    latest.truncate(LATEST_LIMIT);

    let years: BTreeSet<i32> = incidents.iter().map(|i| i.year).collect();
    let groups: BTreeSet<&str> = incidents.iter().map(|i| i.nature.group.as_str()).collect();
    let regions: BTreeSet<&str> = incidents
        .iter()
        .map(|i| i.operational_region.as_str())
        .collect();

    DashboardSummary {
        total: matching.len() as u64,
        total_casualties,
        by_region: ranked(by_region),
        by_group: ranked(by_group),
        by_level: by_level
            .into_iter()
            .map(|(level, count)| LevelCount { level, count })
            .collect(),
        latest: latest.into_iter().cloned().collect(),
        years: years.into_iter().rev().collect(),
        groups: groups.into_iter().map(str::to_string).collect(),
        regions: regions.into_iter().map(str::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use incident_predict_incident_models::{Address, MassCasualty, Nature, StatusTimes};

    fn incident(
        year: i32,
        day: u32,
        region: &str,
        group: &str,
        casualties: u32,
    ) -> IncidentDocument {
        let occurred: NaiveDateTime = NaiveDate::from_ymd_opt(year, 1, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        IncidentDocument {
            notice_number: format!("AV-{year}{day:04}"),
            occurred_at: occurred,
            year,
            operational_region: region.to_string(),
            nature: Nature {
                initial_report: "Smoke seen from afar".to_string(),
                group: group.to_string(),
            },
            address: Address {
                municipality: "Recife".to_string(),
                neighborhood: "Centro".to_string(),
            },
            status_times: StatusTimes {
                h1_receipt: occurred,
                h4_arrival: occurred,
            },
            mass_casualty: MassCasualty::from_casualties(casualties),
        }
    }

    fn corpus() -> Vec<IncidentDocument> {
        vec![
            incident(2022, 1, "RMR", "FIRE", 0),
            incident(2023, 2, "RMR", "PRE_HOSPITAL_CARE", 1),
            incident(2023, 3, "SERTAO", "FIRE", 2),
            incident(2024, 4, "RMR", "PRE_HOSPITAL_CARE", 5),
            incident(2024, 5, "MATA", "RESCUE", 12),
        ]
    }

    #[test]
    fn parse_treats_all_and_blank_as_unfiltered() {
        let filter = DashboardFilter::parse(Some("All"), Some(""), None, Some(" all ")).unwrap();
        assert_eq!(filter, DashboardFilter::default());
    }

    #[test]
    fn parse_rejects_non_numeric_year() {
        let err = DashboardFilter::parse(Some("last year"), None, None, None).unwrap_err();
        assert_eq!(err.field, "year");
    }

    #[test]
    fn parse_keeps_concrete_values() {
        let filter = DashboardFilter::parse(Some("2024"), Some("FIRE"), Some("1"), Some("RMR"))
            .unwrap();
        assert_eq!(filter.year, Some(2024));
        assert_eq!(filter.group.as_deref(), Some("FIRE"));
        assert_eq!(filter.level, Some(1));
        assert_eq!(filter.region.as_deref(), Some("RMR"));
    }

    #[test]
    fn unfiltered_summary_counts_everything() {
        let summary = summarize(&corpus(), &DashboardFilter::default());

        assert_eq!(summary.total, 5);
        assert_eq!(summary.total_casualties, 20);
        assert_eq!(
            summary.by_region[0],
            KeyCount {
                key: "RMR".to_string(),
                count: 3
            }
        );
        assert_eq!(summary.by_group.len(), 3);
        assert_eq!(
            summary.by_level,
            vec![
                LevelCount { level: 0, count: 3 },
                LevelCount { level: 1, count: 1 },
                LevelCount { level: 2, count: 1 },
            ]
        );
    }

    #[test]
    fn ties_are_broken_by_key() {
        let summary = summarize(&corpus(), &DashboardFilter::default());
        let groups: Vec<&str> = summary.by_group.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(groups, vec!["FIRE", "PRE_HOSPITAL_CARE", "RESCUE"]);
    }

    #[test]
    fn filters_combine() {
        let filter = DashboardFilter {
            year: Some(2023),
            region: Some("RMR".to_string()),
            ..DashboardFilter::default()
        };
        let summary = summarize(&corpus(), &filter);

        assert_eq!(summary.total, 1);
        assert_eq!(summary.total_casualties, 1);
        assert_eq!(summary.latest[0].nature.group, "PRE_HOSPITAL_CARE");
    }

    #[test]
    fn latest_is_newest_first() {
        let summary = summarize(&corpus(), &DashboardFilter::default());
        let years: Vec<i32> = summary.latest.iter().map(|i| i.year).collect();
        assert_eq!(years, vec![2024, 2024, 2023, 2023, 2022]);
    }

    #[test]
    fn distinct_lists_ignore_filter() {
        let filter = DashboardFilter {
            group: Some("RESCUE".to_string()),
            ..DashboardFilter::default()
        };
        let summary = summarize(&corpus(), &filter);

        assert_eq!(summary.total, 1);
        assert_eq!(summary.years, vec![2024, 2023, 2022]);
        assert_eq!(summary.regions, vec!["MATA", "RMR", "SERTAO"]);
        assert_eq!(summary.groups, vec!["FIRE", "PRE_HOSPITAL_CARE", "RESCUE"]);
    }

    #[test]
    fn empty_corpus_yields_empty_summary() {
        let summary = summarize(&[], &DashboardFilter::default());
        assert_eq!(summary.total, 0);
        assert!(summary.by_region.is_empty());
        assert!(summary.latest.is_empty());
    }
}

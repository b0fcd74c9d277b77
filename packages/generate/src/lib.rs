#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Synthetic incident corpus generator.
//!
//! Draws incidents from the tables in [`tables`], injecting two
//! correlations the models are expected to pick up: dry-season afternoon
//! fires in the Sertao and rush-hour pre-hospital care in the metropolitan
//! region. Generation is driven by a seeded [`StdRng`], so the same seed
//! and end timestamp always produce the same corpus.
//!
//! [`run`] replaces the whole document store with a freshly generated
//! corpus.

pub mod interactive;
pub mod tables;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Datelike as _, Duration, NaiveDateTime, Timelike as _};
use incident_predict_incident_models::{
    Address, IncidentDocument, IncidentGroup, MassCasualty, Nature, StatusTimes,
};
use incident_predict_store::progress::ProgressCallback;
use incident_predict_store::{DocumentStore, StoreError};
use rand::distributions::{Distribution as _, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::tables::{
    AMBIGUOUS_REPORTS, BASE_GROUP_WEIGHTS, DISPATCH_MINUTES, FIRE_CASUALTIES,
    FIRE_CASUALTY_PROBABILITY, HISTORY_DAYS, LOCATIONS, PRE_HOSPITAL_CASUALTY_WEIGHTS,
    TRAVEL_MINUTES, matching_rule, specific_reports,
};

/// Default number of documents to generate.
pub const DEFAULT_COUNT: u64 = 5000;

/// Errors raised while generating a corpus.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Writing the corpus failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A sampling table is malformed.
    #[error("invalid sampling weights: {0}")]
    Weights(#[from] rand::distributions::WeightedError),
}

/// Arguments for a generation run.
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    /// Number of documents.
    pub count: u64,
    /// RNG seed.
    pub seed: u64,
    /// NDJSON file to replace.
    pub output: PathBuf,
}

/// Draws incidents one at a time.
pub struct Generator {
    rng: StdRng,
    end: NaiveDateTime,
    groups: WeightedIndex<u32>,
    pre_hospital_casualties: WeightedIndex<u32>,
}

impl Generator {
    /// Creates a generator whose timestamps fall in the
    /// [`tables::HISTORY_DAYS`] days before `end`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Weights`] if a weight table is empty or
    /// all zero.
    pub fn new(seed: u64, end: NaiveDateTime) -> Result<Self, GenerateError> {
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            end,
            groups: WeightedIndex::new(BASE_GROUP_WEIGHTS.iter().map(|(_, w)| *w))?,
            pre_hospital_casualties: WeightedIndex::new(
                PRE_HOSPITAL_CASUALTY_WEIGHTS.iter().map(|(_, w)| *w),
            )?,
        })
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        // Tables are non-empty constants.
        *items.choose(&mut self.rng).unwrap_or(&items[0])
    }

    fn occurred_at(&mut self) -> NaiveDateTime {
        let span = HISTORY_DAYS * 24 * 60 * 60;
        let offset = self.rng.gen_range(0..=span);
        self.end - Duration::seconds(offset)
    }

    fn casualties(&mut self, group: IncidentGroup) -> u32 {
        match group {
            IncidentGroup::PreHospitalCare => {
                let idx = self.pre_hospital_casualties.sample(&mut self.rng);
                PRE_HOSPITAL_CASUALTY_WEIGHTS[idx].0
            }
            IncidentGroup::Fire if self.rng.gen_bool(FIRE_CASUALTY_PROBABILITY) => {
                self.rng.gen_range(FIRE_CASUALTIES)
            }
            _ => 0,
        }
    }

    /// Draws the next incident.
    pub fn next_incident(&mut self) -> IncidentDocument {
        let location = self.pick(LOCATIONS);
        let occurred_at = self.occurred_at();

        let (group, report) =
            if let Some(rule) = matching_rule(location.region, occurred_at.hour(), occurred_at.month()) {
                let report = if self.rng.gen_bool(rule.ambiguous_probability) {
                    self.pick(AMBIGUOUS_REPORTS)
                } else {
                    self.pick(specific_reports(rule.group))
                };
                (rule.group, report)
            } else {
                let group = BASE_GROUP_WEIGHTS[self.groups.sample(&mut self.rng)].0;
                (group, self.pick(specific_reports(group)))
            };

        let casualties = self.casualties(group);

        let dispatched = occurred_at + Duration::minutes(self.rng.gen_range(DISPATCH_MINUTES));
        let arrival = dispatched + Duration::minutes(self.rng.gen_range(TRAVEL_MINUTES));

        IncidentDocument {
            notice_number: format!("AV-{:08}", self.rng.gen_range(0..100_000_000u32)),
            occurred_at,
            year: occurred_at.year(),
            operational_region: location.region.to_string(),
            nature: Nature {
                initial_report: report.to_string(),
                group: group.to_string(),
            },
            address: Address {
                municipality: location.municipality.to_string(),
                neighborhood: location.neighborhood.to_string(),
            },
            status_times: StatusTimes {
                h1_receipt: occurred_at,
                h4_arrival: arrival,
            },
            mass_casualty: MassCasualty::from_casualties(casualties),
        }
    }
}

/// Generates `count` incidents.
///
/// # Errors
///
/// Returns [`GenerateError::Weights`] if a weight table is malformed.
pub fn generate_incidents(
    count: u64,
    seed: u64,
    end: NaiveDateTime,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<IncidentDocument>, GenerateError> {
    let mut generator = Generator::new(seed, end)?;
    progress.set_total(count);

    let mut incidents = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
    for _ in 0..count {
        incidents.push(generator.next_incident());
        progress.inc(1);
    }

    Ok(incidents)
}

/// Current local time truncated to whole seconds.
#[must_use]
pub fn now() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Generates a corpus ending now and replaces the store at `args.output`
/// with it. Returns the number of documents written.
///
/// # Errors
///
/// Returns an error if generation fails or the store cannot be written.
pub fn run(args: &GenerateArgs, progress: &Arc<dyn ProgressCallback>) -> Result<u64, GenerateError> {
    log::info!(
        "Generating {} incidents (seed {}) into {}",
        args.count,
        args.seed,
        args.output.display()
    );

    let incidents = generate_incidents(args.count, args.seed, now(), progress)?;
    let written = DocumentStore::open(&args.output).replace_all(&incidents)?;

    progress.finish(format!("Generated {written} incidents"));
    Ok(written)
}

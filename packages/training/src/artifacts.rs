//! The seven persisted artifacts: four models and three encoders.
//!
//! Each artifact is one JSON file with a fixed name inside the artifact
//! directory. There is no manifest; loading simply reads the same names
//! back.

use std::path::{Path, PathBuf};

use incident_predict_boost::{Classifier, Regressor};
use incident_predict_features::{EncoderKind, Encoders, FEATURE_COUNT, LabelEncoder};
use incident_predict_store::paths::ensure_dir;
use serde::Serialize;
use serde::de::DeserializeOwned;
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::TrainingError;

/// File name of the incident group classifier.
pub const MODEL_INCIDENT_GROUP_FILE: &str = "model_incident_group.json";
/// File name of the casualty regressor.
pub const MODEL_CASUALTIES_FILE: &str = "model_casualties.json";
/// File name of the response time regressor.
pub const MODEL_RESPONSE_TIME_FILE: &str = "model_response_time.json";
/// File name of the mass-casualty classifier.
pub const MODEL_MASS_CASUALTY_FILE: &str = "model_mass_casualty.json";
/// File name of the region encoder.
pub const ENCODER_REGION_FILE: &str = "encoder_region.json";
/// File name of the initial report encoder.
pub const ENCODER_REPORT_FILE: &str = "encoder_report.json";
/// File name of the incident group encoder.
pub const ENCODER_GROUP_FILE: &str = "encoder_group.json";

/// Every artifact file name, in write order.
pub const ARTIFACT_FILES: [&str; 7] = [
    MODEL_INCIDENT_GROUP_FILE,
    MODEL_CASUALTIES_FILE,
    MODEL_RESPONSE_TIME_FILE,
    MODEL_MASS_CASUALTY_FILE,
    ENCODER_REGION_FILE,
    ENCODER_REPORT_FILE,
    ENCODER_GROUP_FILE,
];

/// The four trained models, in training order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ModelKind {
    /// Multi-class classifier over incident groups.
    IncidentGroup,
    /// Regressor over casualty counts.
    Casualties,
    /// Regressor over response minutes.
    ResponseTime,
    /// Binary classifier over the mass-casualty flag.
    MassCasualty,
}

impl ModelKind {
    /// All models, in the order they are trained.
    pub const ALL: &[Self] = &[
        Self::IncidentGroup,
        Self::Casualties,
        Self::ResponseTime,
        Self::MassCasualty,
    ];

    /// Human-readable name for log lines and errors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::IncidentGroup => "incident group",
            Self::Casualties => "casualties",
            Self::ResponseTime => "response time",
            Self::MassCasualty => "mass casualty",
        }
    }

    /// Artifact file name of this model.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::IncidentGroup => MODEL_INCIDENT_GROUP_FILE,
            Self::Casualties => MODEL_CASUALTIES_FILE,
            Self::ResponseTime => MODEL_RESPONSE_TIME_FILE,
            Self::MassCasualty => MODEL_MASS_CASUALTY_FILE,
        }
    }
}

/// Underlying cause of a persistence failure.
#[derive(Debug, Error)]
pub enum ArtifactIoError {
    /// The file could not be read or written.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The file contents are not a valid artifact.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Each file is valid on its own but the set does not fit together.
    #[error("inconsistent artifacts: {0}")]
    Inconsistent(String),
}

/// Everything needed to serve predictions.
#[derive(Debug)]
pub struct ArtifactSet {
    /// Incident group classifier.
    pub incident_group: Classifier,
    /// Casualty count regressor.
    pub casualties: Regressor,
    /// Response time regressor.
    pub response_time: Regressor,
    /// Mass-casualty classifier.
    pub mass_casualty: Classifier,
    /// Region, report and group encoders.
    pub encoders: Encoders,
}

impl ArtifactSet {
    /// Writes all seven artifacts into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Persistence`] naming the first file that
    /// could not be written.
    pub fn save(&self, dir: &Path) -> Result<(), TrainingError> {
        ensure_dir(dir).map_err(|e| TrainingError::Persistence {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;

        write_json(dir, MODEL_INCIDENT_GROUP_FILE, &self.incident_group)?;
        write_json(dir, MODEL_CASUALTIES_FILE, &self.casualties)?;
        write_json(dir, MODEL_RESPONSE_TIME_FILE, &self.response_time)?;
        write_json(dir, MODEL_MASS_CASUALTY_FILE, &self.mass_casualty)?;
        write_json(dir, ENCODER_REGION_FILE, &self.encoders.region)?;
        write_json(dir, ENCODER_REPORT_FILE, &self.encoders.report)?;
        write_json(dir, ENCODER_GROUP_FILE, &self.encoders.group)?;

        log::info!("Saved {} artifacts to {}", ARTIFACT_FILES.len(), dir.display());
        Ok(())
    }

    /// Reads all seven artifacts from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Persistence`] naming the first file that is
    /// missing or unreadable.
    pub fn load(dir: &Path) -> Result<Self, TrainingError> {
        let region: LabelEncoder = read_json(dir, ENCODER_REGION_FILE)?;
        let report: LabelEncoder = read_json(dir, ENCODER_REPORT_FILE)?;
        let group: LabelEncoder = read_json(dir, ENCODER_GROUP_FILE)?;

        let set = Self {
            incident_group: read_json(dir, MODEL_INCIDENT_GROUP_FILE)?,
            casualties: read_json(dir, MODEL_CASUALTIES_FILE)?,
            response_time: read_json(dir, MODEL_RESPONSE_TIME_FILE)?,
            mass_casualty: read_json(dir, MODEL_MASS_CASUALTY_FILE)?,
            encoders: Encoders {
                region,
                report,
                group,
            },
        };

        set.check_consistency()
            .map_err(|reason| TrainingError::Persistence {
                path: dir.to_path_buf(),
                source: ArtifactIoError::Inconsistent(reason),
            })?;

        log::debug!("Loaded artifacts from {}", dir.display());
        Ok(set)
    }

    /// Checks the models and encoders agree with each other and with the
    /// feature schema.
    ///
    /// # Errors
    ///
    /// Returns a description of the first mismatch.
    pub fn check_consistency(&self) -> Result<(), String> {
        for (encoder, kind) in [
            (&self.encoders.region, EncoderKind::Region),
            (&self.encoders.report, EncoderKind::Report),
            (&self.encoders.group, EncoderKind::Group),
        ] {
            if encoder.kind() != kind {
                return Err(format!("{kind} encoder file holds a {} encoder", encoder.kind()));
            }
        }

        if self.incident_group.num_classes() != self.encoders.group.len() {
            return Err(format!(
                "incident group model has {} classes but the group encoder has {}",
                self.incident_group.num_classes(),
                self.encoders.group.len()
            ));
        }
        if self.mass_casualty.num_classes() != 2 {
            return Err(format!(
                "mass casualty model has {} classes, expected 2",
                self.mass_casualty.num_classes()
            ));
        }

        for (kind, features) in [
            (ModelKind::IncidentGroup, self.incident_group.num_features()),
            (ModelKind::Casualties, self.casualties.num_features()),
            (ModelKind::ResponseTime, self.response_time.num_features()),
            (ModelKind::MassCasualty, self.mass_casualty.num_features()),
        ] {
            if features != FEATURE_COUNT {
                return Err(format!(
                    "{} model expects {features} features, schema has {FEATURE_COUNT}",
                    kind.label()
                ));
            }
        }
        Ok(())
    }
}

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<(), TrainingError> {
    let path = dir.join(name);
    let result = serde_json::to_vec(value)
        .map_err(ArtifactIoError::from)
        .and_then(|bytes| std::fs::write(&path, bytes).map_err(ArtifactIoError::from));
    result.map_err(|source| TrainingError::Persistence { path, source })
}

fn read_json<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T, TrainingError> {
    let path: PathBuf = dir.join(name);
    let result = std::fs::read(&path)
        .map_err(ArtifactIoError::from)
        .and_then(|bytes| serde_json::from_slice(&bytes).map_err(ArtifactIoError::from));
    result.map_err(|source| TrainingError::Persistence { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_distinct() {
        let mut names = ARTIFACT_FILES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 7);
        for &model in ModelKind::ALL {
            assert!(ARTIFACT_FILES.contains(&model.file_name()));
        }
    }

    #[test]
    fn model_kind_parses_snake_case() {
        assert_eq!("response_time".parse::<ModelKind>().unwrap(), ModelKind::ResponseTime);
        assert_eq!(ModelKind::IncidentGroup.to_string(), "incident_group");
    }

    #[test]
    fn loading_empty_dir_names_missing_file() {
        let dir = std::env::temp_dir().join("incident_predict_artifacts_missing");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        match ArtifactSet::load(&dir) {
            Err(TrainingError::Persistence { path, source }) => {
                assert_eq!(path, dir.join(ENCODER_REGION_FILE));
                assert!(matches!(source, ArtifactIoError::Io(_)));
            }
            other => panic!("expected persistence error, got {other:?}"),
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_artifact_is_reported() {
        let dir = std::env::temp_dir().join("incident_predict_artifacts_corrupt");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(ENCODER_REGION_FILE), "not json").unwrap();

        match ArtifactSet::load(&dir) {
            Err(TrainingError::Persistence { source, .. }) => {
                assert!(matches!(source, ArtifactIoError::Json(_)));
            }
            other => panic!("expected persistence error, got {other:?}"),
        }

        let _ = std::fs::remove_dir_all(&dir);
    }
}

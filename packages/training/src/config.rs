//! Hyper-parameters for the four models, optionally loaded from TOML.
//!
//! ```toml
//! seed = 7
//!
//! [incident_group]
//! max_depth = 4
//!
//! [response_time]
//! n_estimators = 200
//! learning_rate = 0.1
//! ```

use std::path::Path;

use incident_predict_boost::BoostConfig;
use serde::{Deserialize, Serialize};

use crate::TrainingError;
use crate::artifacts::ModelKind;

/// Per-model boosting configuration plus a shared seed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// When set, replaces the `seed` of every model.
    pub seed: Option<u64>,
    /// Incident group classifier.
    pub incident_group: BoostConfig,
    /// Casualty count regressor.
    pub casualties: BoostConfig,
    /// Response time regressor.
    pub response_time: BoostConfig,
    /// Mass-casualty classifier.
    pub mass_casualty: BoostConfig,
}

impl TrainingConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Config`] if the document is not valid TOML
    /// or does not match the expected tables.
    pub fn from_toml_str(s: &str) -> Result<Self, TrainingError> {
        toml::de::from_str(s).map_err(|e| TrainingError::Config(e.to_string()))
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Config`] if the file cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, TrainingError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TrainingError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    /// Overrides the shared seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Effective configuration for `model`, with the shared seed applied.
    #[must_use]
    pub fn for_model(&self, model: ModelKind) -> BoostConfig {
        let mut config = match model {
            ModelKind::IncidentGroup => self.incident_group.clone(),
            ModelKind::Casualties => self.casualties.clone(),
            ModelKind::ResponseTime => self.response_time.clone(),
            ModelKind::MassCasualty => self.mass_casualty.clone(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }

    /// Validates every model's hyper-parameters up front, so a bad value
    /// in the last model does not waste the time spent on the first three.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Config`] naming the model and field.
    pub fn validate(&self) -> Result<(), TrainingError> {
        for &model in ModelKind::ALL {
            self.for_model(model)
                .validate()
                .map_err(|e| TrainingError::Config(format!("{}: {e}", model.label())))?;
        }
        Ok(())
    }
}

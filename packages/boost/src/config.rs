//! Boosting hyper-parameters.

use serde::{Deserialize, Serialize};
use smartcore::tree::decision_tree_regressor::DecisionTreeRegressorParameters;

use crate::BoostError;

/// Hyper-parameters for a single boosted model.
///
/// Every field has a serde default so partial TOML tables only need to
/// name what they override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    /// Number of boosting rounds.
    pub n_estimators: usize,
    /// Shrinkage applied to every tree's output.
    pub learning_rate: f64,
    /// Maximum tree depth.
    pub max_depth: u16,
    /// Minimum number of rows in a leaf.
    pub min_samples_leaf: usize,
    /// Minimum number of rows a node needs before it may split.
    pub min_samples_split: usize,
    /// Fraction of rows sampled for each tree.
    pub subsample: f64,
    /// Seed for row subsampling and permutation importances.
    pub seed: u64,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            min_samples_leaf: 1,
            min_samples_split: 2,
            subsample: 1.0,
            seed: 0,
        }
    }
}

/// `true` for values in `(0, 1]`; `false` for NaN.
pub(crate) fn in_unit_interval(value: f64) -> bool {
    value > 0.0 && value <= 1.0
}

impl BoostConfig {
    /// Checks every hyper-parameter is in range.
    ///
    /// # Errors
    ///
    /// Returns [`BoostError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), BoostError> {
        let invalid =
            |msg: &str| -> Result<(), BoostError> { Err(BoostError::InvalidConfig(msg.to_string())) };

        if self.n_estimators == 0 {
            return invalid("n_estimators must be at least 1");
        }
        if !in_unit_interval(self.learning_rate) {
            return invalid("learning_rate must be in (0, 1]");
        }
        if self.max_depth == 0 {
            return invalid("max_depth must be at least 1");
        }
        if self.min_samples_leaf == 0 {
            return invalid("min_samples_leaf must be at least 1");
        }
        if self.min_samples_split < 2 {
            return invalid("min_samples_split must be at least 2");
        }
        if !in_unit_interval(self.subsample) {
            return invalid("subsample must be in (0, 1]");
        }
        Ok(())
    }

    /// Tree-learner parameters for one boosting round.
    pub(crate) fn tree_parameters(&self) -> DecisionTreeRegressorParameters {
        DecisionTreeRegressorParameters::default()
            .with_max_depth(self.max_depth)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_min_samples_split(self.min_samples_split)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(BoostConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_rounds() {
        let config = BoostConfig {
            n_estimators: 0,
            ..BoostConfig::default()
        };
        assert!(matches!(config.validate(), Err(BoostError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_nan_learning_rate() {
        let config = BoostConfig {
            learning_rate: f64::NAN,
            ..BoostConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_subsample() {
        for subsample in [0.0, 1.5] {
            let config = BoostConfig {
                subsample,
                ..BoostConfig::default()
            };
            assert!(config.validate().is_err(), "subsample = {subsample}");
        }
    }

    #[test]
    fn rejects_empty_leaves_and_unsplittable_nodes() {
        let config = BoostConfig {
            min_samples_leaf: 0,
            ..BoostConfig::default()
        };
        assert!(config.validate().is_err());

        let config = BoostConfig {
            min_samples_split: 1,
            ..BoostConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_tables_fill_defaults() {
        let config: BoostConfig = serde_json::from_str(r#"{"max_depth": 3}"#).unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.n_estimators, 100);
    }
}

//! The boosting loop and the public model types built on it.
//!
//! Every round fits one [`smartcore`] regression tree per margin to the
//! pseudo-residuals of the loss and adds its output, scaled by the learning
//! rate, to that margin.

use std::fmt;

use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;
use rand::{Rng as _, SeedableRng as _};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::DecisionTreeRegressor;

use crate::config::{BoostConfig, in_unit_interval};
use crate::objective::Objective;
use crate::BoostError;

type RegressionTree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Shared ensemble state: base margins plus one tree per group per round.
#[derive(Serialize, Deserialize)]
#[serde(try_from = "BoosterRepr")]
struct Booster {
    objective: Objective,
    num_features: usize,
    learning_rate: f64,
    base_margins: Vec<f64>,
    rounds: Vec<Vec<RegressionTree>>,
    importances: Vec<f64>,
}

/// Unchecked wire form of [`Booster`].
#[derive(Deserialize)]
struct BoosterRepr {
    objective: Objective,
    num_features: usize,
    learning_rate: f64,
    base_margins: Vec<f64>,
    rounds: Vec<Vec<RegressionTree>>,
    importances: Vec<f64>,
}

impl TryFrom<BoosterRepr> for Booster {
    type Error = String;

    fn try_from(repr: BoosterRepr) -> Result<Self, Self::Error> {
        let groups = repr.objective.num_groups();

        if let Objective::Softmax { num_classes } = repr.objective
            && num_classes < 3
        {
            return Err(format!(
                "softmax objective needs at least 3 classes, got {num_classes}"
            ));
        }
        if repr.num_features == 0 {
            return Err("model has no features".to_string());
        }
        if !in_unit_interval(repr.learning_rate) {
            return Err(format!("learning rate {} is outside (0, 1]", repr.learning_rate));
        }
        if repr.base_margins.len() != groups {
            return Err(format!(
                "{} base margins for {groups} margin group(s)",
                repr.base_margins.len()
            ));
        }
        if repr.base_margins.iter().any(|m| !m.is_finite()) {
            return Err("non-finite base margin".to_string());
        }
        if let Some((round, trees)) = repr
            .rounds
            .iter()
            .enumerate()
            .find(|(_, trees)| trees.len() != groups)
        {
            return Err(format!(
                "round {round} has {} trees for {groups} margin group(s)",
                trees.len()
            ));
        }
        if repr.importances.len() != repr.num_features {
            return Err(format!(
                "{} importances for {} features",
                repr.importances.len(),
                repr.num_features
            ));
        }
        if repr.importances.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err("importances must be finite and non-negative".to_string());
        }

        Ok(Self {
            objective: repr.objective,
            num_features: repr.num_features,
            learning_rate: repr.learning_rate,
            base_margins: repr.base_margins,
            rounds: repr.rounds,
            importances: repr.importances,
        })
    }
}

impl fmt::Debug for Booster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Booster")
            .field("objective", &self.objective)
            .field("num_features", &self.num_features)
            .field("learning_rate", &self.learning_rate)
            .field("base_margins", &self.base_margins)
            .field("rounds", &self.rounds.len())
            .field("importances", &self.importances)
            .finish()
    }
}

fn check_shape(x: &ArrayView2<'_, f64>, targets: usize) -> Result<(), BoostError> {
    if x.nrows() == 0 {
        return Err(BoostError::EmptyDataset);
    }
    if x.nrows() != targets {
        return Err(BoostError::LengthMismatch {
            rows: x.nrows(),
            targets,
        });
    }
    Ok(())
}

/// Bernoulli row sample. Never returns an empty set.
fn sample_rows(rows: usize, subsample: f64, rng: &mut StdRng) -> Vec<usize> {
    if subsample >= 1.0 {
        return (0..rows).collect();
    }
    let mut sample: Vec<usize> = (0..rows).filter(|_| rng.gen_bool(subsample)).collect();
    if sample.is_empty() {
        sample.push(rng.gen_range(0..rows));
    }
    sample
}

/// Row-major matrix over `rows`, each `width` values long.
fn to_matrix<'a>(rows: impl ExactSizeIterator<Item = &'a [f64]>, width: usize) -> DenseMatrix<f64> {
    let nrows = rows.len();
    let mut values = Vec::with_capacity(nrows * width);
    for row in rows {
        values.extend_from_slice(row);
    }
    DenseMatrix::new(nrows, width, values, false)
}

/// Scales importances to sum to 1, or spreads them evenly when nothing
/// mattered.
#[allow(clippy::cast_precision_loss)]
fn normalize(increases: Vec<f64>) -> Vec<f64> {
    let total: f64 = increases.iter().sum();
    if total <= 0.0 {
        return vec![1.0 / increases.len() as f64; increases.len()];
    }
    increases.into_iter().map(|v| v / total).collect()
}

impl Booster {
    fn train(
        x: ArrayView2<'_, f64>,
        target: &[f64],
        objective: Objective,
        config: &BoostConfig,
    ) -> Result<Self, BoostError> {
        config.validate()?;
        check_shape(&x, target.len())?;

        let dense: Vec<Vec<f64>> = x.rows().into_iter().map(|r| r.to_vec()).collect();
        if let Some(row) = dense.iter().position(|r| r.iter().any(|v| !v.is_finite())) {
            return Err(BoostError::NonFinite {
                what: "features",
                row,
            });
        }
        if let Some(row) = target.iter().position(|v| !v.is_finite()) {
            return Err(BoostError::NonFinite {
                what: "target",
                row,
            });
        }

        let rows = dense.len();
        let num_features = x.ncols();
        let groups = objective.num_groups();
        let full = to_matrix(dense.iter().map(Vec::as_slice), num_features);
        let base_margins = objective.base_margins(target);

        let mut margins: Vec<Vec<f64>> = base_margins.iter().map(|&b| vec![b; rows]).collect();
        let mut rounds = Vec::with_capacity(config.n_estimators);
        let mut rng = StdRng::seed_from_u64(config.seed);

        for round in 0..config.n_estimators {
            let sample = sample_rows(rows, config.subsample, &mut rng);
            let sampled = (sample.len() < rows).then(|| {
                to_matrix(sample.iter().map(|&i| dense[i].as_slice()), num_features)
            });

            // All groups see the margins from the end of the previous round.
            let residuals: Vec<Vec<f64>> = (0..groups)
                .map(|group| objective.residuals(&margins, target, group))
                .collect();

            let mut trees = Vec::with_capacity(groups);
            for (group, residual) in residuals.iter().enumerate() {
                let y: Vec<f64> = sample.iter().map(|&i| residual[i]).collect();
                let fit_on = sampled.as_ref().unwrap_or(&full);
                let tree = RegressionTree::fit(fit_on, &y, config.tree_parameters())?;
                for (margin, step) in margins[group].iter_mut().zip(tree.predict(&full)?) {
                    *margin += config.learning_rate * step;
                }
                trees.push(tree);
            }

            log::trace!(
                "round {}/{}: {} rows sampled, {} trees",
                round + 1,
                config.n_estimators,
                sample.len(),
                trees.len()
            );
            rounds.push(trees);
        }

        let mut booster = Self {
            objective,
            num_features,
            learning_rate: config.learning_rate,
            base_margins,
            rounds,
            importances: Vec::new(),
        };
        booster.importances = booster.permutation_importances(&dense, target, &margins, &mut rng)?;
        Ok(booster)
    }

    /// Raw margins for every row of `x`, laid out `[group][row]`.
    fn batch_margins(
        &self,
        x: &DenseMatrix<f64>,
        rows: usize,
    ) -> Result<Vec<Vec<f64>>, BoostError> {
        let mut margins: Vec<Vec<f64>> =
            self.base_margins.iter().map(|&b| vec![b; rows]).collect();
        for trees in &self.rounds {
            for (group, tree) in margins.iter_mut().zip(trees) {
                for (margin, step) in group.iter_mut().zip(tree.predict(x)?) {
                    *margin += self.learning_rate * step;
                }
            }
        }
        Ok(margins)
    }

    /// Loss increase when each feature column is shuffled, clamped at
    /// zero and normalized.
    fn permutation_importances(
        &self,
        dense: &[Vec<f64>],
        target: &[f64],
        margins: &[Vec<f64>],
        rng: &mut StdRng,
    ) -> Result<Vec<f64>, BoostError> {
        let baseline = self.objective.loss(margins, target);
        let mut order: Vec<usize> = (0..dense.len()).collect();
        let mut increases = Vec::with_capacity(self.num_features);

        for feature in 0..self.num_features {
            order.shuffle(rng);
            let permuted: Vec<Vec<f64>> = dense
                .iter()
                .zip(&order)
                .map(|(row, &source)| {
                    let mut row = row.clone();
                    row[feature] = dense[source][feature];
                    row
                })
                .collect();
            let x = to_matrix(permuted.iter().map(Vec::as_slice), self.num_features);
            let shuffled = self.batch_margins(&x, dense.len())?;
            increases.push((self.objective.loss(&shuffled, target) - baseline).max(0.0));
        }

        Ok(normalize(increases))
    }

    fn margins(&self, row: &[f64]) -> Result<Vec<f64>, BoostError> {
        if row.len() != self.num_features {
            return Err(BoostError::FeatureCountMismatch {
                expected: self.num_features,
                actual: row.len(),
            });
        }
        let x = to_matrix(std::iter::once(row), self.num_features);
        Ok(self
            .batch_margins(&x, 1)?
            .into_iter()
            .map(|group| group.first().copied().unwrap_or_default())
            .collect())
    }
}

/// A squared-error regression model.
#[derive(Debug, Serialize, Deserialize)]
#[serde(try_from = "RegressorRepr")]
pub struct Regressor {
    booster: Booster,
}

#[derive(Deserialize)]
struct RegressorRepr {
    booster: Booster,
}

impl TryFrom<RegressorRepr> for Regressor {
    type Error = String;

    fn try_from(repr: RegressorRepr) -> Result<Self, Self::Error> {
        match repr.booster.objective {
            Objective::SquaredError => Ok(Self {
                booster: repr.booster,
            }),
            other => Err(format!("regressor cannot use the {other:?} objective")),
        }
    }
}

impl Regressor {
    /// Trains a regressor on `x` (one row per sample) and target `y`.
    ///
    /// # Errors
    ///
    /// * [`BoostError::InvalidConfig`] if `config` is out of range
    /// * [`BoostError::EmptyDataset`] / [`BoostError::LengthMismatch`] on bad shapes
    /// * [`BoostError::NonFinite`] if any input is NaN or infinite
    /// * [`BoostError::Learner`] if a tree cannot be fitted
    pub fn fit(x: ArrayView2<'_, f64>, y: &[f64], config: &BoostConfig) -> Result<Self, BoostError> {
        let booster = Booster::train(x, y, Objective::SquaredError, config)?;
        Ok(Self { booster })
    }

    /// Predicts the target for one feature row.
    ///
    /// # Errors
    ///
    /// Returns [`BoostError::FeatureCountMismatch`] if `row` has the wrong width.
    pub fn predict(&self, row: &[f64]) -> Result<f64, BoostError> {
        Ok(self.booster.margins(row)?[0])
    }

    /// Normalized permutation importance per feature. Sums to 1.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        self.booster.importances.clone()
    }

    /// Number of features the model was trained on.
    #[must_use]
    pub const fn num_features(&self) -> usize {
        self.booster.num_features
    }
}

/// A classifier over labels `0..num_classes`.
///
/// Two classes train with logistic loss, more with softmax loss.
#[derive(Debug, Serialize, Deserialize)]
#[serde(try_from = "ClassifierRepr")]
pub struct Classifier {
    num_classes: usize,
    booster: Booster,
}

#[derive(Deserialize)]
struct ClassifierRepr {
    num_classes: usize,
    booster: Booster,
}

impl TryFrom<ClassifierRepr> for Classifier {
    type Error = String;

    fn try_from(repr: ClassifierRepr) -> Result<Self, Self::Error> {
        let consistent = match repr.booster.objective {
            Objective::Logistic => repr.num_classes == 2,
            Objective::Softmax { num_classes } => num_classes == repr.num_classes,
            Objective::SquaredError => false,
        };
        if !consistent {
            return Err(format!(
                "{:?} objective does not fit a {}-class classifier",
                repr.booster.objective, repr.num_classes
            ));
        }
        Ok(Self {
            num_classes: repr.num_classes,
            booster: repr.booster,
        })
    }
}

impl Classifier {
    /// Trains a classifier on `x` and integer `labels`.
    ///
    /// # Errors
    ///
    /// * [`BoostError::InvalidLabel`] if a label is `>= num_classes`
    /// * [`BoostError::DegenerateTarget`] if fewer than two classes occur
    /// * every error [`Regressor::fit`] can return
    pub fn fit(
        x: ArrayView2<'_, f64>,
        labels: &[u32],
        num_classes: usize,
        config: &BoostConfig,
    ) -> Result<Self, BoostError> {
        check_shape(&x, labels.len())?;

        let mut seen = vec![false; num_classes];
        for &label in labels {
            let slot = usize::try_from(label)
                .ok()
                .and_then(|idx| seen.get_mut(idx))
                .ok_or(BoostError::InvalidLabel { label, num_classes })?;
            *slot = true;
        }
        let distinct = seen.iter().filter(|&&s| s).count();
        if distinct < 2 {
            return Err(BoostError::DegenerateTarget { distinct });
        }

        let objective = if num_classes == 2 {
            Objective::Logistic
        } else {
            Objective::Softmax { num_classes }
        };
        let target: Vec<f64> = labels.iter().map(|&l| f64::from(l)).collect();
        let booster = Booster::train(x, &target, objective, config)?;

        Ok(Self {
            num_classes,
            booster,
        })
    }

    /// Class probabilities for one row. Length `num_classes`, sums to 1.
    ///
    /// # Errors
    ///
    /// Returns [`BoostError::FeatureCountMismatch`] if `row` has the wrong width.
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, BoostError> {
        let margins = self.booster.margins(row)?;
        Ok(self.booster.objective.transform(&margins))
    }

    /// Most probable class; the lowest index wins ties.
    ///
    /// # Errors
    ///
    /// Returns [`BoostError::FeatureCountMismatch`] if `row` has the wrong width.
    pub fn predict_class(&self, row: &[f64]) -> Result<usize, BoostError> {
        let probs = self.predict_proba(row)?;
        let mut best = 0;
        for (class, &p) in probs.iter().enumerate() {
            if p > probs[best] {
                best = class;
            }
        }
        Ok(best)
    }

    /// Number of classes.
    #[must_use]
    pub const fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Normalized permutation importance per feature. Sums to 1.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        self.booster.importances.clone()
    }

    /// Number of features the model was trained on.
    #[must_use]
    pub const fn num_features(&self) -> usize {
        self.booster.num_features
    }
}

//! Loss functions: base margins, residuals, losses and output transforms.

use serde::{Deserialize, Serialize};

/// Clamp for probabilities turned into log-odds, log-priors or log-loss.
const PROBABILITY_EPSILON: f64 = 1e-6;

/// The loss a model is trained against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Objective {
    /// Squared error on a real-valued target.
    SquaredError,
    /// Logistic loss on a 0/1 target.
    Logistic,
    /// Softmax cross-entropy over `num_classes` classes.
    Softmax {
        /// Number of classes.
        num_classes: usize,
    },
}

impl Objective {
    /// Number of trees grown per boosting round (one per margin).
    #[must_use]
    pub const fn num_groups(self) -> usize {
        match self {
            Self::SquaredError | Self::Logistic => 1,
            Self::Softmax { num_classes } => num_classes,
        }
    }

    /// Starting margin for each group, estimated from the target.
    ///
    /// Squared error starts at the mean, logistic at the log-odds of the
    /// positive rate, softmax at the log class priors.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn base_margins(self, target: &[f64]) -> Vec<f64> {
        let n = target.len().max(1) as f64;
        match self {
            Self::SquaredError => vec![target.iter().sum::<f64>() / n],
            Self::Logistic => {
                let rate = (target.iter().sum::<f64>() / n)
                    .clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON);
                vec![(rate / (1.0 - rate)).ln()]
            }
            Self::Softmax { num_classes } => {
                let mut counts = vec![0.0; num_classes];
                for &label in target {
                    counts[label as usize] += 1.0;
                }
                counts
                    .into_iter()
                    .map(|c| (c / n).max(PROBABILITY_EPSILON).ln())
                    .collect()
            }
        }
    }

    /// Pseudo-residuals (negative loss gradient) of group `group` for
    /// every row. Each boosting round fits its trees to these.
    ///
    /// `margins[g][i]` is the current raw score of row `i` for group `g`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn residuals(self, margins: &[Vec<f64>], target: &[f64], group: usize) -> Vec<f64> {
        match self {
            Self::SquaredError => target
                .iter()
                .zip(&margins[0])
                .map(|(y, m)| y - m)
                .collect(),
            Self::Logistic => target
                .iter()
                .zip(&margins[0])
                .map(|(y, &m)| y - sigmoid(m))
                .collect(),
            Self::Softmax { .. } => target
                .iter()
                .enumerate()
                .map(|(i, &y)| {
                    let row: Vec<f64> = margins.iter().map(|m| m[i]).collect();
                    let indicator = if y as usize == group { 1.0 } else { 0.0 };
                    indicator - softmax(&row)[group]
                })
                .collect(),
        }
    }

    /// Mean loss over every row: squared error, log loss or cross-entropy.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn loss(self, margins: &[Vec<f64>], target: &[f64]) -> f64 {
        let n = target.len().max(1) as f64;
        let total: f64 = match self {
            Self::SquaredError => target
                .iter()
                .zip(&margins[0])
                .map(|(y, m)| (y - m).powi(2))
                .sum(),
            Self::Logistic => target
                .iter()
                .zip(&margins[0])
                .map(|(&y, &m)| {
                    let p = sigmoid(m).clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON);
                    -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
                })
                .sum(),
            Self::Softmax { .. } => target
                .iter()
                .enumerate()
                .map(|(i, &y)| {
                    let row: Vec<f64> = margins.iter().map(|m| m[i]).collect();
                    let p = softmax(&row)[y as usize].max(PROBABILITY_EPSILON);
                    -p.ln()
                })
                .sum(),
        };
        total / n
    }

    /// Turns one row's raw margins into the model output: the value for
    /// squared error, `[1 - p, p]` for logistic, class probabilities for
    /// softmax.
    #[must_use]
    pub fn transform(self, margins: &[f64]) -> Vec<f64> {
        match self {
            Self::SquaredError => margins.to_vec(),
            Self::Logistic => {
                let p = sigmoid(margins[0]);
                vec![1.0 - p, p]
            }
            Self::Softmax { .. } => softmax(margins),
        }
    }
}

/// Logistic function.
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax.
#[must_use]
pub fn softmax(margins: &[f64]) -> Vec<f64> {
    let max = margins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = margins.iter().map(|m| (m - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0, 1000.0]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(probs[3] > 0.99);
    }

    #[test]
    fn squared_error_starts_at_mean() {
        let base = Objective::SquaredError.base_margins(&[1.0, 2.0, 6.0]);
        assert_eq!(base, vec![3.0]);
    }

    #[test]
    fn logistic_base_is_log_odds() {
        let base = Objective::Logistic.base_margins(&[1.0, 0.0, 0.0, 0.0]);
        assert!((sigmoid(base[0]) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn softmax_base_reproduces_priors() {
        let objective = Objective::Softmax { num_classes: 3 };
        let base = objective.base_margins(&[0.0, 0.0, 1.0, 2.0]);
        let probs = softmax(&base);
        assert!((probs[0] - 0.5).abs() < 1e-9);
        assert!((probs[1] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn squared_error_residual_is_target_minus_margin() {
        let margins = vec![vec![2.0, 5.0]];
        let residuals = Objective::SquaredError.residuals(&margins, &[1.0, 7.0], 0);
        assert_eq!(residuals, vec![-1.0, 2.0]);
    }

    #[test]
    fn softmax_residuals_sum_to_zero_across_groups() {
        let objective = Objective::Softmax { num_classes: 3 };
        let margins = vec![vec![0.2], vec![-1.0], vec![0.7]];
        let total: f64 = (0..3)
            .map(|group| objective.residuals(&margins, &[2.0], group)[0])
            .sum();
        assert!(total.abs() < 1e-12);
        assert!(objective.residuals(&margins, &[2.0], 2)[0] > 0.0);
    }

    #[test]
    fn logistic_residual_points_toward_label() {
        let margins = vec![vec![0.0, 0.0]];
        let residuals = Objective::Logistic.residuals(&margins, &[1.0, 0.0], 0);
        assert_eq!(residuals, vec![0.5, -0.5]);
    }

    #[test]
    fn loss_drops_as_margins_approach_target() {
        let target = [0.0, 1.0];
        let far = vec![vec![2.0, -2.0]];
        let near = vec![vec![-2.0, 2.0]];
        for objective in [Objective::SquaredError, Objective::Logistic] {
            assert!(objective.loss(&near, &target) < objective.loss(&far, &target));
        }
        assert!((Objective::SquaredError.loss(&far, &target) - 6.5).abs() < 1e-12);
    }

    #[test]
    fn logistic_transform_is_two_class_distribution() {
        let out = Objective::Logistic.transform(&[0.0]);
        assert_eq!(out, vec![0.5, 0.5]);
    }
}

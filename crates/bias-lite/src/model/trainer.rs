use bias_lite_preprocessing::data_loader::{Label, label_counts};
use serde::{Deserialize, Serialize};
use sprs::CsMat;
use tracing::{debug, info, warn};

use super::{LogisticRegression, lbfgs::Lbfgs, sigmoid};
use crate::{Error, Result};

/// Inverse regularization strength.
pub const DEFAULT_C: f64 = 1.0;
pub const DEFAULT_MAX_ITER: usize = 2000;
/// Stop once no gradient component exceeds this value.
pub const DEFAULT_TOL: f64 = 1e-4;
pub const DEFAULT_HISTORY_SIZE: usize = 10;

/// Per-class multiplier applied to each example's loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    /// `n_samples / (2 * count(class))`, so both classes carry equal total weight.
    #[default]
    Balanced,
    Uniform,
}

impl ClassWeight {
    /// Weights indexed by the binary label, given `[neutral, biased]` counts.
    #[must_use]
    pub fn weights(self, counts: [usize; 2]) -> [f64; 2] {
        match self {
            Self::Uniform => [1.0, 1.0],
            Self::Balanced => {
                let total = (counts[0] + counts[1]) as f64;
                counts.map(|count| total / (2.0 * count as f64))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerParams {
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub class_weight: ClassWeight,
    pub history_size: usize,
}

impl Default for TrainerParams {
    fn default() -> Self {
        Self {
            c: DEFAULT_C,
            max_iter: DEFAULT_MAX_ITER,
            tol: DEFAULT_TOL,
            class_weight: ClassWeight::default(),
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

/// How the optimizer run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitSummary {
    pub iterations: usize,
    /// `false` when the iteration cap was hit or the line search stalled.
    pub converged: bool,
    /// Weighted mean log-loss plus the L2 penalty.
    pub loss: f64,
    pub gradient_norm: f64,
    /// Multiplier applied to `[neutral, biased]` examples.
    pub class_weights: [f64; 2],
}

/// L2-regularized logistic regression fitted with L-BFGS.
///
/// Minimizes
///
/// ```text
/// sum_i s_i * logloss(y_i, w.x_i + b) / S + |w|^2 / (2 * C * S)
/// ```
///
/// where `s_i` is the class weight of example `i` and `S = sum_i s_i`. The
/// intercept is not penalized. Fitting is sequential and deterministic.
#[derive(Debug, Clone, Default)]
pub struct LogisticRegressionTrainer {
    params: TrainerParams,
}

impl LogisticRegressionTrainer {
    /// # Panics
    ///
    /// If `c` or `tol` is not strictly positive, or `history_size` is zero.
    pub fn new(params: TrainerParams) -> Self {
        assert!(params.c > 0.0 && params.c.is_finite(), "C must be positive");
        assert!(params.tol > 0.0, "tol must be positive");
        assert!(params.history_size > 0, "history_size must be at least 1");
        Self { params }
    }

    pub fn params(&self) -> &TrainerParams {
        &self.params
    }

    /// Fit on CSR feature rows with one label per row.
    ///
    /// Hitting `max_iter` is not an error: the best parameters found are
    /// returned and [`FitSummary::converged`] is `false`.
    pub fn fit(
        &self,
        features: &CsMat<f64>,
        labels: &[Label],
    ) -> Result<(LogisticRegression, FitSummary)> {
        if features.rows() != labels.len() {
            return Err(Error::LabelCountMismatch {
                rows: features.rows(),
                labels: labels.len(),
            });
        }
        if labels.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }
        let counts = label_counts(labels.iter().copied());
        if let Some(label) = Label::ALL
            .into_iter()
            .find(|label| counts[usize::from(label.to_binary())] == labels.len())
        {
            return Err(Error::SingleClass { label });
        }

        let csr_storage;
        let features = if features.is_csr() {
            features
        } else {
            csr_storage = features.to_csr();
            &csr_storage
        };

        let class_weights = self.params.class_weight.weights(counts);
        let sample_weights = labels
            .iter()
            .map(|label| class_weights[usize::from(label.to_binary())])
            .collect::<Vec<_>>();
        let total_weight = sample_weights.iter().sum::<f64>();
        let targets = labels.iter().map(|label| label.as_target()).collect::<Vec<_>>();
        let n_features = features.cols();
        let penalty = 1.0 / (self.params.c * total_weight);

        debug!(
            n_samples = labels.len(),
            n_features,
            ?counts,
            ?class_weights,
            "Fitting logistic regression"
        );

        let objective = |theta: &[f64], grad: &mut [f64]| -> f64 {
            let (coef, intercept) = theta.split_at(n_features);
            let intercept = intercept[0];
            grad.fill(0.0);

            let mut loss = 0.0;
            for ((row, &y), &weight) in features
                .outer_iterator()
                .zip(&targets)
                .zip(&sample_weights)
            {
                let z = super::linear_score(coef, intercept, row.iter());
                loss += weight * (softplus(z) - y * z);
                let residual = weight * (sigmoid(z) - y);
                for (col_idx, &val) in row.iter() {
                    grad[col_idx] += residual * val;
                }
                grad[n_features] += residual;
            }

            let mut squared_norm = 0.0;
            for (g, &w) in grad[..n_features].iter_mut().zip(coef) {
                *g = *g / total_weight + penalty * w;
                squared_norm += w * w;
            }
            grad[n_features] /= total_weight;

            loss / total_weight + 0.5 * penalty * squared_norm
        };

        let solver = Lbfgs {
            history_size: self.params.history_size,
            max_iter: self.params.max_iter,
            gtol: self.params.tol,
        };
        let mut minimum = solver.minimize(vec![0.0; n_features + 1], objective);

        let summary = FitSummary {
            iterations: minimum.iterations,
            converged: minimum.converged,
            loss: minimum.value,
            gradient_norm: minimum.gradient_norm,
            class_weights,
        };
        if summary.converged {
            info!(
                iterations = summary.iterations,
                loss = summary.loss,
                "Logistic regression converged"
            );
        } else {
            warn!(
                iterations = summary.iterations,
                max_iter = self.params.max_iter,
                gradient_norm = summary.gradient_norm,
                "Logistic regression did not converge, keeping the best parameters found"
            );
        }

        let intercept = minimum.x.pop().unwrap_or_default();
        Ok((LogisticRegression::new(minimum.x, intercept), summary))
    }
}

/// `ln(1 + e^z)` without overflow.
#[inline]
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

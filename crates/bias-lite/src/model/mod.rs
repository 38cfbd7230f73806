//! Binary logistic regression over sparse TF-IDF rows.

mod lbfgs;
mod threshold;
mod trainer;

use sprs::{CsMat, CsVecView};
pub use threshold::CLASSIFICATION_THRESHOLD;
pub use trainer::{
    ClassWeight, DEFAULT_C, DEFAULT_HISTORY_SIZE, DEFAULT_MAX_ITER, DEFAULT_TOL, FitSummary,
    LogisticRegressionTrainer, TrainerParams,
};

use crate::{Error, Result};

/// Numerically stable logistic function.
#[inline]
#[must_use]
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `intercept + coef . x`, accumulated in increasing column order.
///
/// Both the in-process classifier and the exported artifact go through this
/// function so their scores agree exactly.
#[inline]
pub(crate) fn linear_score<'a>(
    coef: &[f64],
    intercept: f64,
    entries: impl IntoIterator<Item = (usize, &'a f64)>,
) -> f64 {
    entries
        .into_iter()
        .fold(intercept, |acc, (col_idx, &val)| acc + coef[col_idx] * val)
}

/// Fitted weights of a binary logistic regression. Class 1 is "biased".
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    coef: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(coef: Vec<f64>, intercept: f64) -> Self {
        Self { coef, intercept }
    }

    pub fn coef(&self) -> &[f64] {
        &self.coef
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn num_features(&self) -> usize {
        self.coef.len()
    }

    /// Log-odds of the biased class for one feature vector.
    pub fn decision_function(&self, x: CsVecView<'_, f64>) -> Result<f64> {
        self.check_dim(x.dim())?;
        Ok(self.score(x))
    }

    /// P(biased) for one feature vector.
    pub fn predict_proba(&self, x: CsVecView<'_, f64>) -> Result<f64> {
        self.decision_function(x).map(sigmoid)
    }

    /// P(biased) for every row of a CSR matrix.
    pub fn predict_proba_matrix(&self, features: &CsMat<f64>) -> Result<Vec<f64>> {
        self.check_dim(features.cols())?;
        Ok(features
            .outer_iterator()
            .map(|row| sigmoid(self.score(row)))
            .collect())
    }

    pub(crate) fn score(&self, x: CsVecView<'_, f64>) -> f64 {
        linear_score(&self.coef, self.intercept, x.iter())
    }

    fn check_dim(&self, actual: usize) -> Result<()> {
        if actual == self.coef.len() {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.coef.len(),
                actual,
            })
        }
    }
}

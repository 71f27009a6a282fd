//! Information-criterion scoring along a single full-data path.
//!
//! For lambda column `j`:
//!
//! ```text
//! mse_j      = Σ (y_i - ŷ_ij)² / n
//! σ̂²        = Σ (y_i - ȳ)² / n          (once, over the full sample)
//! score[j,c] = mse_j / σ̂² + penalty(c, df_j, n)
//! ```
//!
//! Selection per criterion: take the minimal score and, among all lambdas
//! attaining it, the smallest lambda (the least regularized, densest model).

use nalgebra::{DMatrix, DVector};

use crate::domain::{Coefficients, Criterion};
use crate::error::SglError;
use crate::ic::penalty::IcPenalty;
use crate::math::population_variance;
use crate::models::PathFit;

/// Scores of every lambda under every criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct IcScores {
    /// `L × 3` matrix with columns BIC, AIC, AICc.
    pub scores: DMatrix<f64>,
    pub mse: Vec<f64>,
    pub sigsqhat: f64,
}

impl IcScores {
    pub fn column(&self, criterion: Criterion) -> Vec<f64> {
        self.scores.column(criterion.column()).iter().copied().collect()
    }
}

/// Selected lambda for one criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionChoice {
    pub criterion: Criterion,
    pub index: usize,
    pub lambda: f64,
    pub score: f64,
    pub coefficients: Coefficients,
}

/// Score the full-data path `fit` on its own training data.
pub fn score_path<P: IcPenalty + ?Sized>(
    fit: &PathFit,
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    penalty: &P,
) -> Result<IcScores, SglError> {
    let n = y.len();
    let fitted = fit.predict(x)?;
    if fitted.nrows() != n {
        return Err(SglError::data(format!(
            "Fitted values have {} rows, response has {n}.",
            fitted.nrows()
        )));
    }

    let y_vals: Vec<f64> = y.iter().copied().collect();
    let sigsqhat = population_variance(&y_vals);
    if !(sigsqhat.is_finite() && sigsqhat > 0.0) {
        return Err(SglError::data("The response has zero variance."));
    }

    let mse: Vec<f64> = fitted
        .column_iter()
        .map(|col| {
            col.iter()
                .zip(y.iter())
                .map(|(f, yi)| (yi - f).powi(2))
                .sum::<f64>()
                / n as f64
        })
        .collect();

    let scores = DMatrix::from_fn(fit.len(), Criterion::ALL.len(), |j, c| {
        mse[j] / sigsqhat + penalty.penalty(Criterion::ALL[c], fit.df[j], n)
    });

    Ok(IcScores {
        scores,
        mse,
        sigsqhat,
    })
}

/// Index of the minimal score; ties resolve to the smallest lambda.
///
/// `NaN` scores never win. Returns `None` when no score is comparable.
pub fn select_min_score(lambda: &[f64], scores: &[f64]) -> Option<usize> {
    let best = scores
        .iter()
        .copied()
        .filter(|s| !s.is_nan())
        .fold(f64::INFINITY, f64::min);
    if !scores.iter().any(|s| *s == best) {
        return None;
    }

    let mut chosen: Option<usize> = None;
    for (idx, (&l, &s)) in lambda.iter().zip(scores).enumerate() {
        if s != best {
            continue;
        }
        match chosen {
            Some(c) if lambda[c] <= l => {}
            _ => chosen = Some(idx),
        }
    }
    chosen
}

/// Select one lambda per criterion and extract its coefficients.
pub fn choose(fit: &PathFit, scores: &IcScores) -> Result<Vec<CriterionChoice>, SglError> {
    Criterion::ALL
        .iter()
        .map(|&criterion| {
            let column = scores.column(criterion);
            let index = select_min_score(&fit.lambda, &column).ok_or_else(|| {
                SglError::Selection(format!(
                    "No finite {} score along the path.",
                    criterion.display_name()
                ))
            })?;
            Ok(CriterionChoice {
                criterion,
                index,
                lambda: fit.lambda[index],
                score: column[index],
                coefficients: fit.coefficients(index)?,
            })
        })
        .collect()
}

//! Lambda selection from a cross-validated error curve.
//!
//! The rule is injectable; the default is the usual min / one-standard-error
//! pair:
//! 1. `lambda_min`: the largest lambda whose error equals the minimum
//! 2. `lambda_1se`: the largest lambda whose error is within one standard
//!    error (taken at `lambda_min`) of the minimum

use crate::error::SglError;

/// The two picks of a selection rule, as lambda values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambdaPick {
    pub lambda_min: f64,
    pub lambda_1se: f64,
}

/// Turns an error curve into a `lambda_min` / `lambda_1se` pair.
pub trait LambdaSelector: Sync {
    fn select(&self, lambda: &[f64], cvm: &[f64], cvsd: &[f64]) -> Result<LambdaPick, SglError>;
}

/// Minimum / one-standard-error rule. `NaN` entries are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneStandardError;

impl LambdaSelector for OneStandardError {
    fn select(&self, lambda: &[f64], cvm: &[f64], cvsd: &[f64]) -> Result<LambdaPick, SglError> {
        if lambda.len() != cvm.len() || cvm.len() != cvsd.len() {
            return Err(SglError::Selection(format!(
                "Length mismatch: {} lambdas, {} cvm, {} cvsd.",
                lambda.len(),
                cvm.len(),
                cvsd.len()
            )));
        }

        let cvmin = cvm
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(f64::INFINITY, f64::min);
        if !cvmin.is_finite() {
            return Err(SglError::Selection(
                "The cross-validated error curve has no finite value.".to_string(),
            ));
        }

        let lambda_min = largest_lambda_within(lambda, cvm, cvmin).ok_or_else(|| {
            SglError::Selection("No lambda attains the minimum error.".to_string())
        })?;
        let idx_min = lambda
            .iter()
            .position(|&l| l == lambda_min)
            .ok_or_else(|| SglError::Selection("lambda_min is not on the grid.".to_string()))?;

        let semin = cvm[idx_min] + cvsd[idx_min];
        let lambda_1se = if semin.is_nan() {
            lambda_min
        } else {
            largest_lambda_within(lambda, cvm, semin).unwrap_or(lambda_min)
        };

        Ok(LambdaPick {
            lambda_min,
            lambda_1se,
        })
    }
}

fn largest_lambda_within(lambda: &[f64], cvm: &[f64], bound: f64) -> Option<f64> {
    lambda
        .iter()
        .zip(cvm)
        .filter(|(_, m)| **m <= bound)
        .map(|(l, _)| *l)
        .fold(None, |best: Option<f64>, l| Some(best.map_or(l, |b| b.max(l))))
}

//! Path fit container plus the two primitive operations the selection code
//! relies on:
//! - predict responses for new rows at every lambda of the path
//! - extract coefficients (and nonzero counts) at a lambda index

use nalgebra::DMatrix;

use crate::domain::{Coefficients, Effects, Intercept};
use crate::error::SglError;

/// Intercepts along a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Intercepts {
    /// One shared intercept per lambda.
    Pooled(Vec<f64>),
    /// `nf × L` matrix: column `j` holds the unit intercepts at lambda `j`.
    Fixed(DMatrix<f64>),
}

/// A penalized regression path fitted over a decreasing lambda grid.
///
/// The path may be shorter than the requested grid when the solver stops
/// early; every per-lambda field has the same length as `lambda`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathFit {
    pub lambda: Vec<f64>,
    pub intercepts: Intercepts,
    /// `p × L` coefficient matrix.
    pub beta: DMatrix<f64>,
    /// Degrees of freedom per lambda.
    pub df: Vec<f64>,
    /// Total number of block-descent passes over all lambdas.
    pub passes: usize,
}

impl PathFit {
    pub fn len(&self) -> usize {
        self.lambda.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lambda.is_empty()
    }

    pub fn num_covariates(&self) -> usize {
        self.beta.nrows()
    }

    pub fn effects(&self) -> Effects {
        match &self.intercepts {
            Intercepts::Pooled(_) => Effects::Pooled,
            Intercepts::Fixed(a) => Effects::Fixed { nf: a.nrows() },
        }
    }

    /// Predict `newx` at every lambda of the path (`rows × L`).
    ///
    /// For fixed effects, `newx` must be block-ordered by unit with an equal
    /// number of rows per unit; row `r` uses the intercept of unit
    /// `r / (rows / nf)`.
    pub fn predict(&self, newx: &DMatrix<f64>) -> Result<DMatrix<f64>, SglError> {
        if newx.ncols() != self.num_covariates() {
            return Err(SglError::data(format!(
                "Prediction matrix has {} columns, fit has {} covariates.",
                newx.ncols(),
                self.num_covariates()
            )));
        }
        let mut out = newx * &self.beta;
        match &self.intercepts {
            Intercepts::Pooled(a) => {
                for (j, mut col) in out.column_iter_mut().enumerate() {
                    col.add_scalar_mut(a[j]);
                }
            }
            Intercepts::Fixed(a) => {
                let nf = a.nrows();
                let rows = newx.nrows();
                if rows % nf != 0 {
                    return Err(SglError::data(format!(
                        "Cannot split {rows} prediction rows into {nf} equal unit blocks."
                    )));
                }
                let t = rows / nf;
                for j in 0..out.ncols() {
                    for r in 0..rows {
                        out[(r, j)] += a[(r / t, j)];
                    }
                }
            }
        }
        Ok(out)
    }

    /// Number of nonzero coefficients at each lambda.
    pub fn nonzero_count(&self) -> Vec<usize> {
        self.beta
            .column_iter()
            .map(|col| col.iter().filter(|v| **v != 0.0).count())
            .collect()
    }

    /// Coefficient set at lambda index `idx`.
    pub fn coefficients(&self, idx: usize) -> Result<Coefficients, SglError> {
        if idx >= self.len() {
            return Err(SglError::Selection(format!(
                "Lambda index {idx} is outside a path of length {}.",
                self.len()
            )));
        }
        let intercept = match &self.intercepts {
            Intercepts::Pooled(a) => Intercept::Pooled(a[idx]),
            Intercepts::Fixed(a) => Intercept::Fixed(a.column(idx).iter().copied().collect()),
        };
        Ok(Coefficients {
            intercept,
            beta: self.beta.column(idx).iter().copied().collect(),
        })
    }
}

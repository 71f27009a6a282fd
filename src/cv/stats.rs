//! Cross-validated error statistics per lambda.
//!
//! For column `j` of the out-of-fold prediction matrix, with the rows that
//! have a prediction:
//!
//! ```text
//! raw_ij  = loss(y_i - ŷ_ij)
//! cvm_j   = mean(raw_ij)
//! N_j     = N - missing_j
//! cvsd_j  = sqrt( mean((raw_ij - cvm_j)²) / (N_j - 1) )
//! ```
//!
//! With the default `CvLoss::Residual` the raw values are signed residuals,
//! not squared errors.

use nalgebra::DVector;

use crate::cv::aggregate::PredictionMatrix;
use crate::domain::CvLoss;
use crate::error::SglError;
use crate::math::mean_and_standard_error;

/// Per-lambda error curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CvCurve {
    pub cvm: Vec<f64>,
    pub cvsd: Vec<f64>,
    /// Rows contributing to each column.
    pub effective_n: Vec<usize>,
}

impl CvCurve {
    pub fn upper(&self) -> Vec<f64> {
        self.cvm.iter().zip(&self.cvsd).map(|(m, s)| m + s).collect()
    }

    pub fn lower(&self) -> Vec<f64> {
        self.cvm.iter().zip(&self.cvsd).map(|(m, s)| m - s).collect()
    }
}

/// Reduce the prediction matrix to `cvm` / `cvsd`, ignoring missing entries.
pub fn cv_curve(
    y: &DVector<f64>,
    predictions: &PredictionMatrix,
    loss: CvLoss,
) -> Result<CvCurve, SglError> {
    if y.len() != predictions.nrows() {
        return Err(SglError::data(format!(
            "Response has {} entries, prediction matrix has {} rows.",
            y.len(),
            predictions.nrows()
        )));
    }

    let ncols = predictions.ncols();
    let mut cvm = Vec::with_capacity(ncols);
    let mut cvsd = Vec::with_capacity(ncols);
    let mut effective_n = Vec::with_capacity(ncols);

    let mut raw = Vec::with_capacity(y.len());
    for column in predictions.values().column_iter() {
        raw.clear();
        raw.extend(
            column
                .iter()
                .zip(y.iter())
                .filter_map(|(pred, yi)| pred.map(|p| loss.apply(yi - p))),
        );
        let (m, se) = mean_and_standard_error(&raw);
        cvm.push(m);
        cvsd.push(se);
        effective_n.push(raw.len());
    }

    Ok(CvCurve {
        cvm,
        cvsd,
        effective_n,
    })
}

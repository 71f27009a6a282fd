//! Up-front validation shared by the cross-validation and
//! information-criterion entry points.
//!
//! Everything here runs before the first fit, so a bad configuration fails
//! without any solver work.

use nalgebra::{DMatrix, DVector};

use crate::cv::FoldAssignment;
use crate::domain::{GroupIndex, PanelLayout, PanelMethod};
use crate::error::SglError;
use crate::fit::lambda_grid::prepare_user_grid;

/// Check shapes, finiteness, `gamma` and the optional user grid.
///
/// Returns the user grid sorted descending, if one was supplied.
pub(crate) fn check_inputs(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    groups: &GroupIndex,
    gamma: f64,
    lambda: Option<&[f64]>,
) -> Result<Option<Vec<f64>>, SglError> {
    let (n, p) = x.shape();
    if n < 2 || p == 0 {
        return Err(SglError::data(format!(
            "Design matrix must have at least 2 rows and 1 column, got {n}x{p}."
        )));
    }
    if y.len() != n {
        return Err(SglError::data(format!(
            "Response has {} entries, design matrix has {n} rows.",
            y.len()
        )));
    }
    if groups.num_covariates() != p {
        return Err(SglError::config(format!(
            "Group index covers {} covariates, design matrix has {p} columns.",
            groups.num_covariates()
        )));
    }
    if !(gamma.is_finite() && (0.0..=1.0).contains(&gamma)) {
        return Err(SglError::config(format!("gamma must lie in [0, 1], got {gamma}.")));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(SglError::data("Design matrix contains non-finite values."));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(SglError::data("Response contains non-finite values."));
    }
    lambda.map(prepare_user_grid).transpose()
}

/// Unit block layout implied by `method`.
///
/// A pooled panel without a unit count proceeds as a single block of `n`
/// rows, which means folds ignore the time structure.
pub(crate) fn resolve_layout(n: usize, method: PanelMethod) -> Result<PanelLayout, SglError> {
    match method {
        PanelMethod::Single => PanelLayout::new(n, 1),
        PanelMethod::Pooled { nf: None } => {
            log::warn!(
                "Pooled method without nf: proceeding with nf=1, folds will not follow the panel time structure."
            );
            PanelLayout::new(n, 1)
        }
        PanelMethod::Pooled { nf: Some(nf) } | PanelMethod::FixedEffects { nf } => {
            PanelLayout::new(n, nf)
        }
    }
}

/// Fold assignment from an explicit `foldid` or synthesized from `nfolds`.
pub(crate) fn resolve_folds(
    layout: PanelLayout,
    nfolds: usize,
    foldid: Option<&[usize]>,
) -> Result<FoldAssignment, SglError> {
    match foldid {
        Some(ids) => FoldAssignment::from_ids(ids.to_vec(), layout),
        None => FoldAssignment::cyclic(nfolds, layout),
    }
}

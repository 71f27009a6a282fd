//! Lambda grid construction.
//!
//! A path is always fitted from strong to weak regularization so that each
//! solution warm-starts the next one. Grids are therefore kept strictly
//! decreasing: synthesized grids are log-spaced from `λ_max` downwards, and
//! user grids are re-sorted.

use crate::error::SglError;

/// Default number of grid points when the solver synthesizes the grid.
pub const DEFAULT_NLAMBDA: usize = 100;

/// Ratio `λ_min / λ_max` used when none is configured.
///
/// A wider range is allowed when there are more observations than covariates.
pub fn default_lambda_factor(n: usize, p: usize) -> f64 {
    if n > p { 1e-4 } else { 1e-2 }
}

/// Generate `steps` log-spaced points from `max` down to `min` (inclusive).
pub fn log_space_desc(max: f64, min: f64, steps: usize) -> Result<Vec<f64>, SglError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > min) {
        return Err(SglError::config(format!(
            "Invalid lambda range: max={max}, min={min} (must be finite, >0, and max>min)."
        )));
    }
    if steps < 2 {
        return Err(SglError::config("nlambda must be >= 2."));
    }

    let ln_max = max.ln();
    let step = (ln_max - min.ln()) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    out.push(max);
    for i in 1..steps - 1 {
        out.push((ln_max - step * i as f64).exp());
    }
    out.push(min);
    Ok(out)
}

/// Synthesize a grid from `λ_max` with `nlambda` points down to `λ_max · factor`.
pub fn synthesize(lambda_max: f64, nlambda: usize, factor: f64) -> Result<Vec<f64>, SglError> {
    if !(factor.is_finite() && factor > 0.0 && factor < 1.0) {
        return Err(SglError::config(format!(
            "lambda_factor must lie in (0, 1), got {factor}."
        )));
    }
    log_space_desc(lambda_max, lambda_max * factor, nlambda)
}

/// Validate a caller-supplied grid and return it sorted strictly descending.
pub fn prepare_user_grid(lambda: &[f64]) -> Result<Vec<f64>, SglError> {
    if lambda.is_empty() {
        return Err(SglError::config("Lambda grid is empty."));
    }
    if let Some(bad) = lambda.iter().find(|l| !(l.is_finite() && **l > 0.0)) {
        return Err(SglError::config(format!(
            "Lambda values must be finite and positive, got {bad}."
        )));
    }
    let mut grid = lambda.to_vec();
    grid.sort_by(|a, b| b.total_cmp(a));
    if grid.windows(2).any(|w| w[0] == w[1]) {
        return Err(SglError::config("Lambda grid contains duplicate values."));
    }
    Ok(grid)
}

/// `true` when `grid` is strictly decreasing.
pub fn is_strictly_decreasing(grid: &[f64]) -> bool {
    grid.windows(2).all(|w| w[0] > w[1])
}

//! Sparse-group LASSO path solver.
//!
//! Given:
//! - a design matrix `X` (n × p) and response `y`
//! - a group index partitioning the columns
//! - a mixing weight `γ ∈ [0, 1]`
//!
//! we minimize, for each `λ` of a decreasing grid,
//!
//! ```text
//! (1 / 2n) ‖y - a - Xβ‖² + λ [ γ ‖β‖₁ + (1 - γ) Σ_g √p_g ‖β_g‖₂ ]
//! ```
//!
//! by block coordinate descent: each pass visits every group and takes one
//! proximal gradient step of size `1 / L_g`. Solutions are warm-started along
//! the grid, so the path is fitted strictly in order.
//!
//! Intercepts are handled by centring: on global means for a pooled
//! intercept, on within-unit means for fixed effects.

use nalgebra::{DMatrix, DVector};

use crate::domain::{Effects, GroupIndex, PanelLayout};
use crate::error::SglError;
use crate::fit::lambda_grid::{
    DEFAULT_NLAMBDA, default_lambda_factor, prepare_user_grid, synthesize,
};
use crate::math::{block_lipschitz, group_zero_threshold, sparse_group_prox};
use crate::models::{Intercepts, PathFit};

/// Options controlling a single path fit.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    /// Grid length when the grid is synthesized.
    pub nlambda: usize,
    /// `λ_min / λ_max` for a synthesized grid. `None` picks a default from
    /// the problem shape.
    pub lambda_factor: Option<f64>,
    /// Convergence threshold on the weighted squared coefficient change.
    pub eps: f64,
    /// Pass budget per lambda.
    pub max_passes: usize,
    /// Stop the path once more than this many coefficients are nonzero.
    pub dfmax: Option<usize>,
    /// Fit a pooled intercept. Ignored for fixed effects, which always have one.
    pub intercept: bool,
    /// Scale columns to unit variance before fitting.
    pub standardize: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            nlambda: DEFAULT_NLAMBDA,
            lambda_factor: None,
            eps: 1e-8,
            max_passes: 100_000,
            dfmax: None,
            intercept: true,
            standardize: false,
        }
    }
}

/// One path fit request. All inputs are borrowed read-only.
#[derive(Debug, Clone, Copy)]
pub struct PathRequest<'a> {
    pub x: &'a DMatrix<f64>,
    pub y: &'a DVector<f64>,
    /// Decreasing grid to honour. `None` lets the solver synthesize one.
    pub lambda: Option<&'a [f64]>,
    pub gamma: f64,
    pub groups: &'a GroupIndex,
    pub effects: Effects,
}

/// Fits a regularization path for one observation subset.
///
/// Implementations must honour a supplied grid (possibly returning a
/// shorter prefix of it) and must be safe to call from several threads.
pub trait PathSolver: Sync {
    fn fit(&self, request: &PathRequest<'_>) -> Result<PathFit, SglError>;
}

/// Block coordinate descent solver for the sparse-group LASSO.
#[derive(Debug, Clone, Default)]
pub struct SgLassoSolver {
    options: SolverOptions,
}

impl SgLassoSolver {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }
}

/// Centred (and optionally scaled) copy of the data.
struct Centred {
    x: DMatrix<f64>,
    y: DVector<f64>,
    /// Column means per intercept unit (`units × p`, original scale).
    x_means: DMatrix<f64>,
    y_means: Vec<f64>,
    /// Column scale factors (all ones without standardization).
    scale: Vec<f64>,
    layout: Option<PanelLayout>,
}

impl Centred {
    fn new(
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        effects: Effects,
        intercept: bool,
        standardize: bool,
    ) -> Result<Self, SglError> {
        let n = x.nrows();
        let p = x.ncols();

        let layout = match effects {
            Effects::Pooled => None,
            Effects::Fixed { nf } => Some(PanelLayout::new(n, nf)?),
        };
        let (units, block) = match layout {
            Some(l) => (l.nf, l.t),
            None => (1, n),
        };
        let centre = intercept || layout.is_some();

        let mut xc = x.clone();
        let mut yc = y.clone();
        let mut x_means = DMatrix::<f64>::zeros(units, p);
        let mut y_means = vec![0.0; units];

        if centre {
            for u in 0..units {
                let rows = u * block..(u + 1) * block;
                let ybar = y.rows(rows.start, block).mean();
                y_means[u] = ybar;
                for r in rows.clone() {
                    yc[r] -= ybar;
                }
                for j in 0..p {
                    let xbar = x.view((rows.start, j), (block, 1)).mean();
                    x_means[(u, j)] = xbar;
                    for r in rows.clone() {
                        xc[(r, j)] -= xbar;
                    }
                }
            }
        }

        let mut scale = vec![1.0; p];
        if standardize {
            for (j, s) in scale.iter_mut().enumerate() {
                let sd = (xc.column(j).norm_squared() / n as f64).sqrt();
                if sd > 0.0 {
                    *s = sd;
                    xc.column_mut(j).unscale_mut(sd);
                }
            }
        }

        Ok(Self {
            x: xc,
            y: yc,
            x_means,
            y_means,
            scale,
            layout,
        })
    }
}

/// Columns of one group on the centred scale.
struct Block {
    cols: Vec<usize>,
    x: DMatrix<f64>,
    lipschitz: f64,
    weight: f64,
}

impl PathSolver for SgLassoSolver {
    fn fit(&self, request: &PathRequest<'_>) -> Result<PathFit, SglError> {
        let PathRequest {
            x,
            y,
            lambda,
            gamma,
            groups,
            effects,
        } = *request;
        let n = x.nrows();
        let p = x.ncols();

        if n < 2 {
            return Err(SglError::solver(format!("Cannot fit a path on {n} observations.")));
        }
        if y.len() != n {
            return Err(SglError::solver(format!(
                "Response has {} entries, design matrix has {n} rows.",
                y.len()
            )));
        }
        if groups.num_covariates() != p {
            return Err(SglError::solver(format!(
                "Group index covers {} covariates, design matrix has {p}.",
                groups.num_covariates()
            )));
        }
        if !(0.0..=1.0).contains(&gamma) {
            return Err(SglError::solver(format!("gamma must lie in [0, 1], got {gamma}.")));
        }

        let opts = &self.options;
        let data = Centred::new(x, y, effects, opts.intercept, opts.standardize)?;

        let blocks: Vec<Block> = groups
            .groups()
            .iter()
            .map(|cols| {
                let xg = data.x.select_columns(cols);
                Block {
                    lipschitz: block_lipschitz(&xg, n),
                    weight: (cols.len() as f64).sqrt(),
                    cols: cols.clone(),
                    x: xg,
                }
            })
            .collect();

        let grid = match lambda {
            Some(user) => prepare_user_grid(user)?,
            None => {
                let lambda_max = lambda_max(&blocks, &data.y, n, gamma);
                if !(lambda_max.is_finite() && lambda_max > 0.0) {
                    return Err(SglError::solver(
                        "The response has no variation left after centring; lambda_max is zero.",
                    ));
                }
                let factor = opts
                    .lambda_factor
                    .unwrap_or_else(|| default_lambda_factor(n, p));
                synthesize(lambda_max, opts.nlambda, factor)?
            }
        };

        let mut b = vec![0.0; p];
        let mut resid = data.y.clone();
        let mut lambdas = Vec::with_capacity(grid.len());
        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(grid.len());
        let mut df = Vec::with_capacity(grid.len());
        let mut total_passes = 0;

        for (l, &lam) in grid.iter().enumerate() {
            let passes = match self.descend(&blocks, &mut b, &mut resid, lam, gamma, n) {
                Some(passes) => passes,
                None if l == 0 => {
                    return Err(SglError::solver(format!(
                        "No convergence within {} passes at the first lambda ({lam:.4e}).",
                        opts.max_passes
                    )));
                }
                None => {
                    log::warn!(
                        "No convergence within {} passes at lambda[{l}]={lam:.4e}; path truncated to {l} values.",
                        opts.max_passes
                    );
                    break;
                }
            };
            total_passes += passes;

            let nonzero = b.iter().filter(|v| **v != 0.0).count();
            if let Some(dfmax) = opts.dfmax {
                if nonzero > dfmax {
                    log::debug!(
                        "dfmax={dfmax} exceeded at lambda[{l}]={lam:.4e}; path stops at {l} values."
                    );
                    break;
                }
            }
            log::trace!("lambda[{l}]={lam:.4e}: {passes} passes, {nonzero} nonzero");

            lambdas.push(lam);
            columns.push(b.iter().zip(&data.scale).map(|(v, s)| v / s).collect());
            df.push(nonzero as f64);
        }

        if lambdas.is_empty() {
            return Err(SglError::solver("The fitted path is empty."));
        }

        let beta = DMatrix::from_fn(p, columns.len(), |j, l| columns[l][j]);
        let intercepts = recover_intercepts(&data, &beta);

        Ok(PathFit {
            lambda: lambdas,
            intercepts,
            beta,
            df,
            passes: total_passes,
        })
    }
}

impl SgLassoSolver {
    /// Run block descent at one lambda from the current warm start.
    ///
    /// Returns the number of passes, or `None` if the pass budget ran out.
    fn descend(
        &self,
        blocks: &[Block],
        b: &mut [f64],
        resid: &mut DVector<f64>,
        lambda: f64,
        gamma: f64,
        n: usize,
    ) -> Option<usize> {
        let inv_n = 1.0 / n as f64;
        for pass in 1..=self.options.max_passes {
            let mut max_change = 0.0_f64;
            for block in blocks {
                let lip = block.lipschitz;
                if lip <= 0.0 {
                    continue;
                }
                let grad = block.x.tr_mul(&*resid) * inv_n;
                let old: Vec<f64> = block.cols.iter().map(|&j| b[j]).collect();
                let mut z: Vec<f64> = old
                    .iter()
                    .zip(grad.iter())
                    .map(|(bo, g)| bo + g / lip)
                    .collect();
                sparse_group_prox(
                    &mut z,
                    lambda * gamma / lip,
                    lambda * (1.0 - gamma) * block.weight / lip,
                );

                let delta = DVector::from_iterator(
                    z.len(),
                    z.iter().zip(&old).map(|(new, prev)| new - prev),
                );
                let step = delta.amax();
                if step == 0.0 {
                    continue;
                }
                resid.gemv(-1.0, &block.x, &delta, 1.0);
                for (k, &j) in block.cols.iter().enumerate() {
                    b[j] = z[k];
                }
                max_change = max_change.max(lip * step * step);
            }
            if max_change < self.options.eps {
                return Some(pass);
            }
        }
        None
    }
}

/// Smallest lambda at which every group is zero.
fn lambda_max(blocks: &[Block], y: &DVector<f64>, n: usize, gamma: f64) -> f64 {
    blocks
        .iter()
        .map(|block| {
            let score: Vec<f64> = (block.x.tr_mul(y) / n as f64).iter().copied().collect();
            group_zero_threshold(&score, gamma, block.weight)
        })
        .fold(0.0, f64::max)
}

/// Intercepts on the original scale: `ȳ_u - x̄_uᵀ β` for each unit `u`.
fn recover_intercepts(data: &Centred, beta: &DMatrix<f64>) -> Intercepts {
    let offsets = &data.x_means * beta;
    match data.layout {
        None => Intercepts::Pooled(
            offsets
                .row(0)
                .iter()
                .map(|o| data.y_means[0] - o)
                .collect(),
        ),
        Some(layout) => Intercepts::Fixed(DMatrix::from_fn(layout.nf, beta.ncols(), |u, l| {
            data.y_means[u] - offsets[(u, l)]
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleConfig, generate_sample};
    use crate::fit::lambda_grid::is_strictly_decreasing;

    fn request<'a>(
        x: &'a DMatrix<f64>,
        y: &'a DVector<f64>,
        groups: &'a GroupIndex,
        effects: Effects,
    ) -> PathRequest<'a> {
        PathRequest {
            x,
            y,
            lambda: None,
            gamma: 0.5,
            groups,
            effects,
        }
    }

    #[test]
    fn synthesized_path_starts_empty_and_grows() {
        let sample = generate_sample(&SampleConfig::default()).unwrap();
        let solver = SgLassoSolver::default();
        let fit = solver
            .fit(&request(&sample.x, &sample.y, &sample.groups, Effects::Pooled))
            .unwrap();

        assert_eq!(fit.len(), DEFAULT_NLAMBDA);
        assert!(is_strictly_decreasing(&fit.lambda));
        let nz = fit.nonzero_count();
        assert_eq!(nz[0], 0);
        assert!(nz[nz.len() - 1] > 0);
        assert_eq!(fit.df.len(), fit.len());
        assert_eq!(fit.beta.nrows(), 20);
    }

    #[test]
    fn weak_penalty_recovers_least_squares_signal() {
        let config = SampleConfig {
            noise_sd: 0.01,
            ..SampleConfig::default()
        };
        let sample = generate_sample(&config).unwrap();
        let solver = SgLassoSolver::default();
        let lambda = [1e-6];
        let mut req = request(&sample.x, &sample.y, &sample.groups, Effects::Pooled);
        req.lambda = Some(&lambda);
        let fit = solver.fit(&req).unwrap();

        for (est, truth) in fit.beta.column(0).iter().zip(&sample.beta) {
            assert!((est - truth).abs() < 0.05, "estimate {est} vs truth {truth}");
        }
    }

    #[test]
    fn user_grid_is_honoured() {
        let sample = generate_sample(&SampleConfig::default()).unwrap();
        let solver = SgLassoSolver::default();
        let lambda = [0.01, 0.5, 0.1];
        let mut req = request(&sample.x, &sample.y, &sample.groups, Effects::Pooled);
        req.lambda = Some(&lambda);
        let fit = solver.fit(&req).unwrap();
        assert_eq!(fit.lambda, vec![0.5, 0.1, 0.01]);
    }

    #[test]
    fn group_lasso_end_keeps_groups_whole() {
        // With gamma = 0 the penalty is a pure group LASSO: every group is
        // either entirely zero or entirely nonzero.
        let sample = generate_sample(&SampleConfig::default()).unwrap();
        let solver = SgLassoSolver::default();
        let mut req = request(&sample.x, &sample.y, &sample.groups, Effects::Pooled);
        req.gamma = 0.0;
        let fit = solver.fit(&req).unwrap();
        for l in 0..fit.len() {
            for cols in sample.groups.groups() {
                let nz = cols.iter().filter(|&&j| fit.beta[(j, l)] != 0.0).count();
                assert!(nz == 0 || nz == cols.len());
            }
        }
    }

    #[test]
    fn fixed_effects_return_one_intercept_per_unit() {
        let config = SampleConfig {
            nf: Some(10),
            ..SampleConfig::default()
        };
        let sample = generate_sample(&config).unwrap();
        let solver = SgLassoSolver::default();
        let fit = solver
            .fit(&request(&sample.x, &sample.y, &sample.groups, Effects::Fixed { nf: 10 }))
            .unwrap();
        match &fit.intercepts {
            Intercepts::Fixed(a) => {
                assert_eq!(a.nrows(), 10);
                assert_eq!(a.ncols(), fit.len());
            }
            Intercepts::Pooled(_) => panic!("expected fixed effects"),
        }
    }

    #[test]
    fn dfmax_truncates_the_path() {
        let sample = generate_sample(&SampleConfig::default()).unwrap();
        let solver = SgLassoSolver::new(SolverOptions {
            dfmax: Some(3),
            ..SolverOptions::default()
        });
        let fit = solver
            .fit(&request(&sample.x, &sample.y, &sample.groups, Effects::Pooled))
            .unwrap();
        assert!(fit.len() < DEFAULT_NLAMBDA);
        assert!(fit.nonzero_count().iter().all(|&k| k <= 3));
    }

    #[test]
    fn constant_response_is_a_solver_failure() {
        let sample = generate_sample(&SampleConfig::default()).unwrap();
        let y = DVector::from_element(sample.y.len(), 3.0);
        let solver = SgLassoSolver::default();
        let err = solver
            .fit(&request(&sample.x, &y, &sample.groups, Effects::Pooled))
            .unwrap_err();
        assert!(matches!(err, SglError::Solver(_)));
    }
}

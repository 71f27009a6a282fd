//! Cross-validated lambda selection.
//!
//! Workflow of one call:
//! validate -> full-data path -> folds -> K fold paths -> out-of-fold
//! predictions -> error curve -> min / 1-SE picks -> coefficients.

use nalgebra::{DMatrix, DVector};

use crate::cv::{
    FoldAssignment, FoldInputs, LambdaSelector, OneStandardError, aggregate_predictions,
    cv_curve,
};
use crate::domain::{Coefficients, CvLoss, GroupIndex, PanelMethod};
use crate::error::SglError;
use crate::fit::{PathRequest, PathSolver, SgLassoSolver, SolverOptions};
use crate::models::PathFit;
use crate::select::validate::{check_inputs, resolve_folds, resolve_layout};

/// Default number of folds.
pub const DEFAULT_NFOLDS: usize = 10;

/// Cross-validation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CvOptions {
    /// User lambda grid; re-sorted descending. `None` lets the solver build one.
    pub lambda: Option<Vec<f64>>,
    /// Mixing weight between the LASSO (1) and group LASSO (0) penalties.
    pub gamma: f64,
    pub nfolds: usize,
    /// Explicit 1-based fold ids. Overrides `nfolds` with the largest id.
    pub foldid: Option<Vec<usize>>,
    pub loss: CvLoss,
    /// Fit folds on the rayon pool.
    pub parallel: bool,
    /// Options for the default solver used by `cv_single` / `cv_panel`.
    pub solver: SolverOptions,
}

impl Default for CvOptions {
    fn default() -> Self {
        Self {
            lambda: None,
            gamma: 1.0,
            nfolds: DEFAULT_NFOLDS,
            foldid: None,
            loss: CvLoss::default(),
            parallel: true,
            solver: SolverOptions::default(),
        }
    }
}

/// Output of a cross-validation run.
#[derive(Debug, Clone)]
pub struct CvResult {
    pub method: PanelMethod,
    pub lambda: Vec<f64>,
    pub cvm: Vec<f64>,
    pub cvsd: Vec<f64>,
    pub cvupper: Vec<f64>,
    pub cvlower: Vec<f64>,
    /// Nonzero coefficients of the full-data fit per lambda.
    pub nzero: Vec<usize>,
    /// Name of the error measure.
    pub name: &'static str,
    pub foldid: FoldAssignment,
    /// Full-data path.
    pub fit: PathFit,
    pub lambda_min: f64,
    pub lambda_1se: f64,
    pub idx_min: usize,
    pub idx_1se: usize,
    pub lam_min: Coefficients,
    pub lam_1se: Coefficients,
}

/// Cross-validation engine with an injectable solver and selection rule.
#[derive(Debug, Clone)]
pub struct CrossValidator<S = SgLassoSolver, R = OneStandardError> {
    solver: S,
    rule: R,
}

impl CrossValidator {
    pub fn new(options: SolverOptions) -> Self {
        Self {
            solver: SgLassoSolver::new(options),
            rule: OneStandardError,
        }
    }
}

impl<S: PathSolver, R: LambdaSelector> CrossValidator<S, R> {
    pub fn with_parts(solver: S, rule: R) -> Self {
        Self { solver, rule }
    }

    /// Run cross-validation. `options.solver` is not consulted here; the
    /// engine's own solver is used.
    pub fn run(
        &self,
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        groups: &GroupIndex,
        method: PanelMethod,
        options: &CvOptions,
    ) -> Result<CvResult, SglError> {
        let user_grid = check_inputs(x, y, groups, options.gamma, options.lambda.as_deref())?;
        let layout = resolve_layout(x.nrows(), method)?;
        let folds = resolve_folds(layout, options.nfolds, options.foldid.as_deref())?;
        let effects = method.effects();

        log::info!(
            "Cross-validating sg-LASSO ({}): n={}, p={}, groups={}, gamma={}, nfolds={}",
            method.label(),
            x.nrows(),
            x.ncols(),
            groups.num_groups(),
            options.gamma,
            folds.nfolds()
        );

        let fit = self
            .solver
            .fit(&PathRequest {
                x,
                y,
                lambda: user_grid.as_deref(),
                gamma: options.gamma,
                groups,
                effects,
            })
            .map_err(|e| SglError::solver(format!("full-data fit: {}", e.detail())))?;
        let lambda = fit.lambda.clone();
        let nzero = fit.nonzero_count();
        log::debug!("full-data path has {} lambdas", lambda.len());

        let predictions = aggregate_predictions(
            &self.solver,
            &FoldInputs {
                x,
                y,
                lambda: &lambda,
                gamma: options.gamma,
                groups,
                effects,
            },
            &folds,
            options.parallel,
        )?;
        let curve = cv_curve(y, &predictions, options.loss)?;

        let pick = self.rule.select(&lambda, &curve.cvm, &curve.cvsd)?;
        let idx_min = grid_index(&lambda, pick.lambda_min, "lambda_min")?;
        let idx_1se = grid_index(&lambda, pick.lambda_1se, "lambda_1se")?;

        log::info!(
            "lambda_min={:.6e} (index {idx_min}, {} nonzero), lambda_1se={:.6e} (index {idx_1se}, {} nonzero)",
            pick.lambda_min,
            nzero[idx_min],
            pick.lambda_1se,
            nzero[idx_1se]
        );

        Ok(CvResult {
            method,
            cvupper: curve.upper(),
            cvlower: curve.lower(),
            cvm: curve.cvm,
            cvsd: curve.cvsd,
            nzero,
            name: options.loss.label(),
            foldid: folds,
            lam_min: fit.coefficients(idx_min)?,
            lam_1se: fit.coefficients(idx_1se)?,
            lambda,
            fit,
            lambda_min: pick.lambda_min,
            lambda_1se: pick.lambda_1se,
            idx_min,
            idx_1se,
        })
    }
}

/// Cross-validate single-outcome data with the default solver and rule.
pub fn cv_single(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    groups: &GroupIndex,
    options: &CvOptions,
) -> Result<CvResult, SglError> {
    CrossValidator::new(options.solver.clone()).run(x, y, groups, PanelMethod::Single, options)
}

/// Cross-validate panel data with the default solver and rule.
pub fn cv_panel(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    groups: &GroupIndex,
    method: PanelMethod,
    options: &CvOptions,
) -> Result<CvResult, SglError> {
    CrossValidator::new(options.solver.clone()).run(x, y, groups, method, options)
}

fn grid_index(lambda: &[f64], value: f64, what: &str) -> Result<usize, SglError> {
    lambda
        .iter()
        .position(|&l| l == value)
        .ok_or_else(|| SglError::Selection(format!("{what}={value} is not on the lambda grid.")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv::LambdaPick;
    use crate::data::{SampleConfig, generate_sample};
    use crate::domain::{Effects, Intercept};
    use crate::fit::lambda_grid::DEFAULT_NLAMBDA;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scenario_a() -> crate::data::SampleData {
        generate_sample(&SampleConfig::default()).unwrap()
    }

    fn options() -> CvOptions {
        CvOptions {
            gamma: 0.5,
            ..CvOptions::default()
        }
    }

    #[test]
    fn scenario_single_outcome_defaults() {
        let s = scenario_a();
        let cv = cv_single(&s.x, &s.y, &s.groups, &options()).unwrap();

        assert_eq!(cv.lam_min.beta.len(), 20);
        assert_eq!(cv.lambda.len(), DEFAULT_NLAMBDA);
        for v in [&cv.cvm, &cv.cvsd, &cv.cvupper, &cv.cvlower] {
            assert_eq!(v.len(), cv.lambda.len());
        }
        assert_eq!(cv.nzero.len(), cv.lambda.len());
        assert_eq!(cv.foldid.nfolds(), DEFAULT_NFOLDS);
        assert!(matches!(cv.lam_min.intercept, Intercept::Pooled(_)));
        assert_eq!(cv.name, "Mean Residual");
    }

    #[test]
    fn returned_grid_matches_a_full_data_fit() {
        let s = scenario_a();
        let cv = cv_single(&s.x, &s.y, &s.groups, &options()).unwrap();
        let full = SgLassoSolver::default()
            .fit(&PathRequest {
                x: &s.x,
                y: &s.y,
                lambda: None,
                gamma: 0.5,
                groups: &s.groups,
                effects: Effects::Pooled,
            })
            .unwrap();
        assert_eq!(cv.lambda, full.lambda);
        assert!(cv.lambda.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn picks_are_on_the_grid_and_min_is_exact() {
        let s = scenario_a();
        let cv = cv_single(&s.x, &s.y, &s.groups, &options()).unwrap();
        assert_eq!(cv.lambda[cv.idx_min], cv.lambda_min);
        assert_eq!(cv.lambda[cv.idx_1se], cv.lambda_1se);
        let min = cv.cvm.iter().copied().filter(|v| !v.is_nan()).fold(f64::INFINITY, f64::min);
        assert_eq!(cv.cvm[cv.idx_min], min);
        assert!(cv.lambda_1se >= cv.lambda_min);
    }

    #[test]
    fn squared_loss_prefers_a_sparse_signal_model() {
        let s = scenario_a();
        let opts = CvOptions {
            loss: CvLoss::Squared,
            ..options()
        };
        let cv = cv_single(&s.x, &s.y, &s.groups, &opts).unwrap();
        assert_eq!(cv.name, "Mean Squared Error");
        // The two strongest true coefficients must survive at lambda_min.
        assert!(cv.lam_min.beta[0] > 0.5);
        assert!(cv.lam_min.beta[1] < -0.3);
        assert!(cv.cvm.iter().all(|v| v.is_nan() || *v >= 0.0));
    }

    #[test]
    fn explicit_foldid_is_deterministic() {
        let s = scenario_a();
        let foldid: Vec<usize> = (0..100).map(|i| (i * 7) % 5 + 1).collect();
        let opts = CvOptions {
            foldid: Some(foldid),
            ..options()
        };
        let a = cv_single(&s.x, &s.y, &s.groups, &opts).unwrap();
        let b = cv_single(&s.x, &s.y, &s.groups, &CvOptions { parallel: false, ..opts })
            .unwrap();
        assert_eq!(a.foldid.nfolds(), 5);
        assert_eq!(a.cvm, b.cvm);
        assert_eq!(a.cvsd, b.cvsd);
        assert_eq!(a.lambda_min, b.lambda_min);
    }

    /// Counts fits so tests can assert validation happens first.
    struct CountingSolver {
        inner: SgLassoSolver,
        calls: AtomicUsize,
    }

    impl PathSolver for CountingSolver {
        fn fit(&self, request: &PathRequest<'_>) -> Result<PathFit, SglError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fit(request)
        }
    }

    #[test]
    fn two_folds_fail_before_any_fit() {
        let s = scenario_a();
        let solver = CountingSolver {
            inner: SgLassoSolver::default(),
            calls: AtomicUsize::new(0),
        };
        let engine = CrossValidator::with_parts(solver, OneStandardError);
        let opts = CvOptions {
            nfolds: 2,
            ..options()
        };
        let err = engine
            .run(&s.x, &s.y, &s.groups, PanelMethod::Single, &opts)
            .unwrap_err();
        assert!(matches!(err, SglError::Configuration(_)));
        assert_eq!(engine.solver.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn short_panel_with_too_few_time_points_fails_before_any_fit() {
        let s = generate_sample(&SampleConfig {
            nf: Some(50),
            ..SampleConfig::default()
        })
        .unwrap();
        let solver = CountingSolver {
            inner: SgLassoSolver::default(),
            calls: AtomicUsize::new(0),
        };
        let engine = CrossValidator::with_parts(solver, OneStandardError);
        let err = engine
            .run(&s.x, &s.y, &s.groups, PanelMethod::FixedEffects { nf: 50 }, &options())
            .unwrap_err();
        assert!(matches!(err, SglError::Configuration(_)));
        assert_eq!(engine.solver.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn solver_runs_once_per_fold_plus_full_data() {
        let s = scenario_a();
        let solver = CountingSolver {
            inner: SgLassoSolver::default(),
            calls: AtomicUsize::new(0),
        };
        let engine = CrossValidator::with_parts(solver, OneStandardError);
        let opts = CvOptions {
            nfolds: 4,
            ..options()
        };
        engine
            .run(&s.x, &s.y, &s.groups, PanelMethod::Single, &opts)
            .unwrap();
        assert_eq!(engine.solver.calls.load(Ordering::SeqCst), 5);
    }

    /// Picks a lambda that is not on the grid.
    struct OffGridRule;

    impl LambdaSelector for OffGridRule {
        fn select(&self, lambda: &[f64], _: &[f64], _: &[f64]) -> Result<LambdaPick, SglError> {
            Ok(LambdaPick {
                lambda_min: lambda[0] * 2.0,
                lambda_1se: lambda[0],
            })
        }
    }

    #[test]
    fn off_grid_pick_is_a_selection_error() {
        let s = scenario_a();
        let engine = CrossValidator::with_parts(SgLassoSolver::default(), OffGridRule);
        let err = engine
            .run(&s.x, &s.y, &s.groups, PanelMethod::Single, &options())
            .unwrap_err();
        assert!(matches!(err, SglError::Selection(_)));
    }

    #[test]
    fn scenario_fixed_effects_panel() {
        let s = generate_sample(&SampleConfig {
            nf: Some(10),
            ..SampleConfig::default()
        })
        .unwrap();
        let method = PanelMethod::FixedEffects { nf: 10 };
        let cv = cv_panel(&s.x, &s.y, &s.groups, method, &options()).unwrap();

        let ids = cv.foldid.ids();
        for t in 0..10 {
            for u in 1..10 {
                assert_eq!(ids[t], ids[t + u * 10]);
            }
        }
        match &cv.lam_min.intercept {
            Intercept::Fixed(a) => assert_eq!(a.len(), 10),
            Intercept::Pooled(_) => panic!("expected fixed effects"),
        }
        assert_eq!(cv.lam_min.beta.len(), 20);
    }

    #[test]
    fn pooled_panel_without_units_still_runs() {
        let s = scenario_a();
        let method = PanelMethod::Pooled { nf: None };
        let cv = cv_panel(&s.x, &s.y, &s.groups, method, &options()).unwrap();
        assert_eq!(&cv.foldid.ids()[..4], &[1, 2, 3, 4]);
        assert!(matches!(cv.lam_1se.intercept, Intercept::Pooled(_)));
    }

    #[test]
    fn user_grid_is_resorted_and_kept() {
        let s = scenario_a();
        let opts = CvOptions {
            lambda: Some(vec![0.01, 0.2, 0.05]),
            ..options()
        };
        let cv = cv_single(&s.x, &s.y, &s.groups, &opts).unwrap();
        assert_eq!(cv.lambda, vec![0.2, 0.05, 0.01]);
    }
}

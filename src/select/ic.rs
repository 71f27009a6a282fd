//! Information-criterion lambda selection on panel or single-outcome data.
//!
//! One full-data path is scored under BIC, AIC and AICc; no folding.

use nalgebra::{DMatrix, DVector};

use crate::domain::{Criterion, GroupIndex, PanelMethod};
use crate::error::SglError;
use crate::fit::{PathRequest, PathSolver, SgLassoSolver, SolverOptions};
use crate::ic::{CriterionChoice, IcPenalty, IcScores, StandardPenalty, choose, score_path};
use crate::models::PathFit;
use crate::select::validate::{check_inputs, resolve_layout};

/// Information-criterion settings.
#[derive(Debug, Clone, PartialEq)]
pub struct IcOptions {
    pub lambda: Option<Vec<f64>>,
    pub gamma: f64,
    pub solver: SolverOptions,
}

impl Default for IcOptions {
    fn default() -> Self {
        Self {
            lambda: None,
            gamma: 1.0,
            solver: SolverOptions::default(),
        }
    }
}

/// Output of an information-criterion run.
#[derive(Debug, Clone)]
pub struct IcResult {
    pub method: PanelMethod,
    pub lambda: Vec<f64>,
    pub scores: IcScores,
    pub fit: PathFit,
    pub bic: CriterionChoice,
    pub aic: CriterionChoice,
    pub aicc: CriterionChoice,
}

impl IcResult {
    pub fn choice(&self, criterion: Criterion) -> &CriterionChoice {
        match criterion {
            Criterion::Bic => &self.bic,
            Criterion::Aic => &self.aic,
            Criterion::Aicc => &self.aicc,
        }
    }
}

/// Information-criterion engine with an injectable solver and penalty.
#[derive(Debug, Clone)]
pub struct InformationCriterion<S = SgLassoSolver, P = StandardPenalty> {
    solver: S,
    penalty: P,
}

impl InformationCriterion {
    pub fn new(options: SolverOptions) -> Self {
        Self {
            solver: SgLassoSolver::new(options),
            penalty: StandardPenalty,
        }
    }
}

impl<S: PathSolver, P: IcPenalty> InformationCriterion<S, P> {
    pub fn with_parts(solver: S, penalty: P) -> Self {
        Self { solver, penalty }
    }

    pub fn run(
        &self,
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        groups: &GroupIndex,
        method: PanelMethod,
        options: &IcOptions,
    ) -> Result<IcResult, SglError> {
        let user_grid = check_inputs(x, y, groups, options.gamma, options.lambda.as_deref())?;
        resolve_layout(x.nrows(), method)?;

        log::info!(
            "Scoring sg-LASSO path by information criteria ({}): n={}, p={}, groups={}, gamma={}",
            method.label(),
            x.nrows(),
            x.ncols(),
            groups.num_groups(),
            options.gamma
        );

        let fit = self
            .solver
            .fit(&PathRequest {
                x,
                y,
                lambda: user_grid.as_deref(),
                gamma: options.gamma,
                groups,
                effects: method.effects(),
            })
            .map_err(|e| SglError::solver(format!("full-data fit: {}", e.detail())))?;

        let scores = score_path(&fit, x, y, &self.penalty)?;
        let mut picks = choose(&fit, &scores)?.into_iter();
        let (Some(bic), Some(aic), Some(aicc)) = (picks.next(), picks.next(), picks.next()) else {
            return Err(SglError::Selection("Missing criterion choice.".to_string()));
        };

        for c in [&bic, &aic, &aicc] {
            log::info!(
                "{}: lambda={:.6e} (index {}), score={:.6}",
                c.criterion.display_name(),
                c.lambda,
                c.index,
                c.score
            );
        }

        Ok(IcResult {
            method,
            lambda: fit.lambda.clone(),
            scores,
            fit,
            bic,
            aic,
            aicc,
        })
    }
}

/// Select lambda by BIC / AIC / AICc with the default solver and penalty.
pub fn ic_panel(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    groups: &GroupIndex,
    method: PanelMethod,
    options: &IcOptions,
) -> Result<IcResult, SglError> {
    InformationCriterion::new(options.solver.clone()).run(x, y, groups, method, options)
}

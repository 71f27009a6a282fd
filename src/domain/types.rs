//! Shared domain types.
//!
//! These are the small, validated value types that flow between the solver,
//! the cross-validation engine and the information-criterion engine:
//!
//! - method tags (`MethodKind`) and the resolved `PanelMethod` variant
//! - the validated `GroupIndex`
//! - per-lambda coefficient sets (`Coefficients`, `Intercept`)
//! - selection knobs (`CvLoss`, `Criterion`)

use std::collections::BTreeMap;

use clap::ValueEnum;

use crate::error::SglError;

/// Method tag as written by a caller (`single`, `pooled`, `fe`).
///
/// This is only an input convenience; the pipeline works on `PanelMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodKind {
    Single,
    Pooled,
    Fe,
}

/// How the intercept and fold structure are organised.
///
/// Each variant carries exactly the unit information it needs, so an `fe`
/// model without a unit count cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMethod {
    /// Single-outcome regression: one intercept, no unit blocks.
    Single,
    /// Panel with one shared intercept. `nf` only shapes the folds.
    Pooled { nf: Option<usize> },
    /// Panel with one intercept per cross-sectional unit.
    FixedEffects { nf: usize },
}

impl PanelMethod {
    /// Build a method from a tag and an optional unit count.
    pub fn from_parts(kind: MethodKind, nf: Option<usize>) -> Result<Self, SglError> {
        if nf == Some(0) {
            return Err(SglError::config("nf must be a positive unit count."));
        }
        match kind {
            MethodKind::Single => Ok(PanelMethod::Single),
            MethodKind::Pooled => Ok(PanelMethod::Pooled { nf }),
            MethodKind::Fe => match nf {
                Some(nf) => Ok(PanelMethod::FixedEffects { nf }),
                None => Err(SglError::config(
                    "The fixed-effects method requires the number of units (nf).",
                )),
            },
        }
    }

    /// Intercept structure the solver has to fit.
    pub fn effects(self) -> Effects {
        match self {
            PanelMethod::Single | PanelMethod::Pooled { .. } => Effects::Pooled,
            PanelMethod::FixedEffects { nf } => Effects::Fixed { nf },
        }
    }

    /// Unit count used to lay out folds. `None` means no unit blocking.
    pub fn units(self) -> Option<usize> {
        match self {
            PanelMethod::Single => None,
            PanelMethod::Pooled { nf } => nf,
            PanelMethod::FixedEffects { nf } => Some(nf),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PanelMethod::Single => "single",
            PanelMethod::Pooled { .. } => "pooled",
            PanelMethod::FixedEffects { .. } => "fe",
        }
    }
}

/// Intercept structure of a fitted path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effects {
    Pooled,
    Fixed { nf: usize },
}

/// Block layout of a panel: `nf` units of `t` consecutive rows each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout {
    pub nf: usize,
    pub t: usize,
}

impl PanelLayout {
    /// Split `n` rows into `nf` equal unit blocks.
    pub fn new(n: usize, nf: usize) -> Result<Self, SglError> {
        if nf == 0 {
            return Err(SglError::config("nf must be a positive unit count."));
        }
        if n == 0 || n % nf != 0 {
            return Err(SglError::config(format!(
                "Sample size {n} is not divisible into {nf} equal unit blocks."
            )));
        }
        Ok(Self { nf, t: n / nf })
    }

    /// Unit (0-based) owning row `row`.
    pub fn unit_of(&self, row: usize) -> usize {
        row / self.t
    }
}

/// Validated group membership, one positive group id per covariate.
///
/// Groups need not be contiguous. Iteration order over groups is by
/// ascending group id; members within a group keep column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIndex {
    ids: Vec<usize>,
    members: Vec<Vec<usize>>,
}

impl GroupIndex {
    /// Validate `ids` against `p` covariates.
    pub fn new(ids: Vec<usize>, p: usize) -> Result<Self, SglError> {
        if ids.len() != p {
            return Err(SglError::config(format!(
                "Group index has {} entries but the design matrix has {p} columns.",
                ids.len()
            )));
        }
        if p == 0 {
            return Err(SglError::config("Group index is empty."));
        }
        if let Some(col) = ids.iter().position(|&g| g == 0) {
            return Err(SglError::config(format!(
                "Group ids must be positive (column {col} has id 0)."
            )));
        }

        let mut by_id: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (col, &g) in ids.iter().enumerate() {
            by_id.entry(g).or_default().push(col);
        }

        Ok(Self {
            ids,
            members: by_id.into_values().collect(),
        })
    }

    /// Contiguous groups of `size` columns (the last group may be shorter).
    pub fn contiguous(p: usize, size: usize) -> Result<Self, SglError> {
        if size == 0 {
            return Err(SglError::config("Group size must be positive."));
        }
        Self::new((0..p).map(|j| j / size + 1).collect(), p)
    }

    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// Column indices per group.
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.members
    }

    pub fn num_covariates(&self) -> usize {
        self.ids.len()
    }

    pub fn num_groups(&self) -> usize {
        self.members.len()
    }
}

/// Intercept part of a coefficient set.
#[derive(Debug, Clone, PartialEq)]
pub enum Intercept {
    Pooled(f64),
    /// One intercept per unit, in block order.
    Fixed(Vec<f64>),
}

/// Coefficients at one lambda.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    pub intercept: Intercept,
    /// Slope coefficients, length p.
    pub beta: Vec<f64>,
}

/// Per-observation loss used to reduce out-of-fold predictions.
///
/// `Residual` keeps the signed residual `y - ŷ` as is and is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CvLoss {
    #[default]
    Residual,
    Squared,
    Absolute,
}

impl CvLoss {
    pub fn apply(self, residual: f64) -> f64 {
        match self {
            CvLoss::Residual => residual,
            CvLoss::Squared => residual * residual,
            CvLoss::Absolute => residual.abs(),
        }
    }

    /// Human-readable name of the error measure.
    pub fn label(self) -> &'static str {
        match self {
            CvLoss::Residual => "Mean Residual",
            CvLoss::Squared => "Mean Squared Error",
            CvLoss::Absolute => "Mean Absolute Error",
        }
    }
}

/// Information criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    Bic,
    Aic,
    Aicc,
}

impl Criterion {
    /// Column order of the score matrix.
    pub const ALL: [Criterion; 3] = [Criterion::Bic, Criterion::Aic, Criterion::Aicc];

    pub fn column(self) -> usize {
        match self {
            Criterion::Bic => 0,
            Criterion::Aic => 1,
            Criterion::Aicc => 2,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Criterion::Bic => "BIC",
            Criterion::Aic => "AIC",
            Criterion::Aicc => "AICc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fe_without_units_is_rejected() {
        let err = PanelMethod::from_parts(MethodKind::Fe, None).unwrap_err();
        assert!(matches!(err, SglError::Configuration(_)));
    }

    #[test]
    fn pooled_units_are_optional() {
        assert_eq!(
            PanelMethod::from_parts(MethodKind::Pooled, None).unwrap(),
            PanelMethod::Pooled { nf: None }
        );
        let fe = PanelMethod::from_parts(MethodKind::Fe, Some(4)).unwrap();
        assert_eq!(fe.effects(), Effects::Fixed { nf: 4 });
        assert_eq!(fe.units(), Some(4));
    }

    #[test]
    fn group_index_collects_non_contiguous_members() {
        let g = GroupIndex::new(vec![2, 1, 2, 3, 1], 5).unwrap();
        assert_eq!(g.num_groups(), 3);
        assert_eq!(g.groups()[0], vec![1, 4]);
        assert_eq!(g.groups()[1], vec![0, 2]);
        assert_eq!(g.groups()[2], vec![3]);
    }

    #[test]
    fn group_index_rejects_bad_input() {
        assert!(GroupIndex::new(vec![1, 1], 3).is_err());
        assert!(GroupIndex::new(vec![1, 0, 2], 3).is_err());
    }

    #[test]
    fn contiguous_groups_have_requested_size() {
        let g = GroupIndex::contiguous(20, 5).unwrap();
        assert_eq!(g.num_groups(), 4);
        assert!(g.groups().iter().all(|m| m.len() == 5));
    }

    #[test]
    fn panel_layout_requires_even_blocks() {
        assert_eq!(PanelLayout::new(100, 10).unwrap().t, 10);
        assert!(PanelLayout::new(101, 10).is_err());
        assert_eq!(PanelLayout::new(100, 10).unwrap().unit_of(35), 3);
    }
}

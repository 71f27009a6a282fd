//! Fold assignment.
//!
//! Folds are built over time positions, not rows: a cyclic `1..K` sequence of
//! length `T` is tiled once per unit block, so the same time position lands in
//! the same fold for every unit. Single-outcome data is the `nf = 1` case.

use std::collections::BTreeSet;

use crate::domain::PanelLayout;
use crate::error::SglError;

/// Fewest folds a cross-validation run accepts.
pub const MIN_FOLDS: usize = 3;

/// Fold id (1-based) per observation row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldAssignment {
    ids: Vec<usize>,
    nfolds: usize,
}

impl FoldAssignment {
    /// Cyclic assignment `1, 2, .., K, 1, 2, ..` of length `layout.t`, tiled
    /// over `layout.nf` unit blocks.
    pub fn cyclic(nfolds: usize, layout: PanelLayout) -> Result<Self, SglError> {
        check_nfolds(nfolds)?;
        check_nonempty_folds(nfolds.min(layout.t))?;
        if nfolds > layout.t {
            log::warn!(
                "nfolds={nfolds} exceeds the {} time positions per unit; some folds will be empty.",
                layout.t
            );
        }
        let pattern: Vec<usize> = (0..layout.t).map(|t| t % nfolds + 1).collect();
        let ids = pattern
            .iter()
            .copied()
            .cycle()
            .take(layout.t * layout.nf)
            .collect();
        Ok(Self { ids, nfolds })
    }

    /// Use caller-supplied fold ids. The fold count becomes the largest id.
    ///
    /// For panel layouts the ids must repeat identically in every unit block.
    pub fn from_ids(ids: Vec<usize>, layout: PanelLayout) -> Result<Self, SglError> {
        let n = layout.t * layout.nf;
        if ids.len() != n {
            return Err(SglError::config(format!(
                "foldid has {} entries but there are {n} observations.",
                ids.len()
            )));
        }
        if ids.contains(&0) {
            return Err(SglError::config("Fold ids must be positive (1-based)."));
        }
        let nfolds = ids.iter().copied().max().unwrap_or(0);
        check_nfolds(nfolds)?;
        let distinct: BTreeSet<usize> = ids.iter().copied().collect();
        check_nonempty_folds(distinct.len())?;

        let first = &ids[..layout.t];
        for unit in 1..layout.nf {
            let block = &ids[unit * layout.t..(unit + 1) * layout.t];
            if block != first {
                return Err(SglError::config(format!(
                    "foldid differs between unit 1 and unit {} for the same time positions.",
                    unit + 1
                )));
            }
        }
        Ok(Self { ids, nfolds })
    }

    pub fn nfolds(&self) -> usize {
        self.nfolds
    }

    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Rows held out by `fold` (1-based).
    pub fn held_out(&self, fold: usize) -> Vec<usize> {
        self.rows_where(|id| id == fold)
    }

    /// Rows used to train when `fold` is held out.
    pub fn training(&self, fold: usize) -> Vec<usize> {
        self.rows_where(|id| id != fold)
    }

    fn rows_where(&self, keep: impl Fn(usize) -> bool) -> Vec<usize> {
        self.ids
            .iter()
            .enumerate()
            .filter_map(|(row, &id)| keep(id).then_some(row))
            .collect()
    }
}

fn check_nfolds(nfolds: usize) -> Result<(), SglError> {
    if nfolds < MIN_FOLDS {
        return Err(SglError::config(format!(
            "nfolds must be at least {MIN_FOLDS}; got {nfolds} (nfolds=10 recommended)."
        )));
    }
    Ok(())
}

/// Folds that actually hold rows; ids above the time length stay empty.
fn check_nonempty_folds(count: usize) -> Result<(), SglError> {
    if count < MIN_FOLDS {
        return Err(SglError::config(format!(
            "Only {count} folds hold observations; at least {MIN_FOLDS} are needed."
        )));
    }
    Ok(())
}

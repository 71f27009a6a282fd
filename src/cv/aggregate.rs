//! Out-of-fold prediction aggregation.
//!
//! Each fold is refitted on the remaining rows over the full-data grid and
//! then predicts its own held-out rows. A fold's path may stop before the end
//! of the grid, so the aggregated matrix keeps `None` wherever a fold never
//! reached a lambda.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::cv::folds::FoldAssignment;
use crate::domain::{Effects, GroupIndex};
use crate::error::SglError;
use crate::fit::{PathRequest, PathSolver};

/// Out-of-fold predictions, `N × L`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionMatrix {
    values: DMatrix<Option<f64>>,
    /// Path length reached by each fold.
    fold_lengths: Vec<usize>,
}

impl PredictionMatrix {
    pub fn values(&self) -> &DMatrix<Option<f64>> {
        &self.values
    }

    pub fn fold_lengths(&self) -> &[usize] {
        &self.fold_lengths
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    /// Number of rows without a prediction in column `j`.
    pub fn missing_in_column(&self, j: usize) -> usize {
        self.values.column(j).iter().filter(|v| v.is_none()).count()
    }
}

/// Shared read-only inputs of every fold fit.
#[derive(Debug, Clone, Copy)]
pub struct FoldInputs<'a> {
    pub x: &'a DMatrix<f64>,
    pub y: &'a DVector<f64>,
    pub lambda: &'a [f64],
    pub gamma: f64,
    pub groups: &'a GroupIndex,
    pub effects: Effects,
}

/// Fit every fold and collect out-of-fold predictions.
///
/// With `parallel`, fold fits run on the rayon pool; they only read the
/// shared inputs and are written into the matrix in fold order afterwards.
/// The first failing fold aborts the whole aggregation.
pub fn aggregate_predictions<S: PathSolver>(
    solver: &S,
    inputs: &FoldInputs<'_>,
    folds: &FoldAssignment,
    parallel: bool,
) -> Result<PredictionMatrix, SglError> {
    let fold_ids: Vec<usize> = (1..=folds.nfolds()).collect();
    let run = |fold: usize| fit_fold(solver, inputs, folds, fold);

    let per_fold: Vec<FoldPrediction> = if parallel {
        fold_ids.par_iter().map(|&f| run(f)).collect::<Result<_, _>>()?
    } else {
        fold_ids.iter().map(|&f| run(f)).collect::<Result<_, _>>()?
    };

    let n = inputs.x.nrows();
    let nlambda = inputs.lambda.len();
    let mut values = DMatrix::from_element(n, nlambda, None);
    let mut fold_lengths = Vec::with_capacity(per_fold.len());

    for fp in per_fold {
        let width = fp.predictions.ncols().min(nlambda);
        for (k, &row) in fp.rows.iter().enumerate() {
            for j in 0..width {
                values[(row, j)] = Some(fp.predictions[(k, j)]);
            }
        }
        fold_lengths.push(width);
    }

    Ok(PredictionMatrix {
        values,
        fold_lengths,
    })
}

struct FoldPrediction {
    rows: Vec<usize>,
    predictions: DMatrix<f64>,
}

fn fit_fold<S: PathSolver>(
    solver: &S,
    inputs: &FoldInputs<'_>,
    folds: &FoldAssignment,
    fold: usize,
) -> Result<FoldPrediction, SglError> {
    let held_out = folds.held_out(fold);
    if held_out.is_empty() {
        log::debug!("fold {fold} holds no rows; skipping its fit");
        return Ok(FoldPrediction {
            rows: held_out,
            predictions: DMatrix::zeros(0, 0),
        });
    }
    let train = folds.training(fold);

    let x_train = inputs.x.select_rows(&train);
    let y_train = inputs.y.select_rows(&train);
    let fit = solver
        .fit(&PathRequest {
            x: &x_train,
            y: &y_train,
            lambda: Some(inputs.lambda),
            gamma: inputs.gamma,
            groups: inputs.groups,
            effects: inputs.effects,
        })
        .map_err(|e| SglError::solver(format!("fold {fold}: {}", e.detail())))?;

    let x_test = inputs.x.select_rows(&held_out);
    let predictions = fit.predict(&x_test)?;
    log::debug!(
        "fold {fold}: trained on {} rows, predicted {} rows over {} lambdas",
        train.len(),
        held_out.len(),
        fit.len()
    );

    Ok(FoldPrediction {
        rows: held_out,
        predictions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PanelLayout;
    use crate::models::{Intercepts, PathFit};

    /// Predicts the training mean everywhere and stops its path after
    /// `len_for(fold size)` lambdas.
    struct MeanSolver {
        truncate_small: bool,
    }

    impl PathSolver for MeanSolver {
        fn fit(&self, request: &PathRequest<'_>) -> Result<PathFit, SglError> {
            let grid = request.lambda.unwrap_or(&[1.0]);
            let len = if self.truncate_small && request.x.nrows() % 2 == 1 {
                grid.len() - 1
            } else {
                grid.len()
            };
            let p = request.x.ncols();
            Ok(PathFit {
                lambda: grid[..len].to_vec(),
                intercepts: Intercepts::Pooled(vec![request.y.mean(); len]),
                beta: DMatrix::zeros(p, len),
                df: vec![0.0; len],
                passes: 0,
            })
        }
    }

    struct FailingSolver;

    impl PathSolver for FailingSolver {
        fn fit(&self, _request: &PathRequest<'_>) -> Result<PathFit, SglError> {
            Err(SglError::solver("singular"))
        }
    }

    fn data(n: usize) -> (DMatrix<f64>, DVector<f64>, GroupIndex) {
        let x = DMatrix::from_fn(n, 2, |i, j| (i + j) as f64);
        let y = DVector::from_fn(n, |i, _| i as f64);
        (x, y, GroupIndex::new(vec![1, 1], 2).unwrap())
    }

    #[test]
    fn every_row_gets_exactly_one_prediction_per_reached_lambda() {
        let (x, y, groups) = data(12);
        let lambda = [1.0, 0.5, 0.25];
        let inputs = FoldInputs {
            x: &x,
            y: &y,
            lambda: &lambda,
            gamma: 0.5,
            groups: &groups,
            effects: Effects::Pooled,
        };
        let folds = FoldAssignment::cyclic(4, PanelLayout { nf: 1, t: 12 }).unwrap();
        let pm = aggregate_predictions(&MeanSolver { truncate_small: false }, &inputs, &folds, true)
            .unwrap();
        assert_eq!((pm.nrows(), pm.ncols()), (12, 3));
        assert!(pm.values().iter().all(|v| v.is_some()));

        // Fold 1 holds rows 0, 4, 8 and trains on the mean of the rest.
        let train_mean = (0..12).filter(|i| i % 4 != 0).sum::<usize>() as f64 / 9.0;
        assert_eq!(pm.values()[(4, 2)], Some(train_mean));
    }

    #[test]
    fn ragged_folds_leave_missing_entries() {
        // 10 rows in 3 folds: training sizes 6, 7, 7. Odd-sized fits lose one lambda.
        let (x, y, groups) = data(10);
        let lambda = [1.0, 0.5];
        let inputs = FoldInputs {
            x: &x,
            y: &y,
            lambda: &lambda,
            gamma: 0.5,
            groups: &groups,
            effects: Effects::Pooled,
        };
        let folds = FoldAssignment::cyclic(3, PanelLayout { nf: 1, t: 10 }).unwrap();
        let pm = aggregate_predictions(&MeanSolver { truncate_small: true }, &inputs, &folds, false)
            .unwrap();
        assert_eq!(pm.fold_lengths(), &[2, 1, 1]);
        assert_eq!(pm.missing_in_column(0), 0);
        assert_eq!(pm.missing_in_column(1), 6);
    }

    #[test]
    fn a_failing_fold_aborts_the_run() {
        let (x, y, groups) = data(9);
        let lambda = [1.0];
        let inputs = FoldInputs {
            x: &x,
            y: &y,
            lambda: &lambda,
            gamma: 0.5,
            groups: &groups,
            effects: Effects::Pooled,
        };
        let folds = FoldAssignment::cyclic(3, PanelLayout { nf: 1, t: 9 }).unwrap();
        let err = aggregate_predictions(&FailingSolver, &inputs, &folds, true).unwrap_err();
        assert!(matches!(err, SglError::Solver(_)));
        let message = err.to_string();
        assert!(message.ends_with(": singular"));
        assert_eq!(message.matches("Path solver failed").count(), 1);
    }
}

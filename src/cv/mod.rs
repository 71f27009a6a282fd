//! Cross-validation machinery.
//!
//! Responsibilities:
//!
//! - assign rows to folds, keeping panel time positions aligned across units
//! - refit each fold and aggregate out-of-fold predictions (parallel)
//! - reduce predictions to a per-lambda error curve
//! - pick `lambda_min` / `lambda_1se` from the curve

pub mod aggregate;
pub mod folds;
pub mod rule;
pub mod stats;

pub use aggregate::*;
pub use folds::*;
pub use rule::*;
pub use stats::*;

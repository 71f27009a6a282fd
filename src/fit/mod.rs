//! Penalized path fitting.
//!
//! - lambda grids (`lambda_grid`)
//! - the sparse-group LASSO path solver (`solver`)

pub mod lambda_grid;
pub mod solver;

pub use lambda_grid::*;
pub use solver::*;

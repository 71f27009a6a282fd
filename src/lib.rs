//! `sgl-select` library crate.
//!
//! Sparse-group LASSO tuning-parameter selection for single-outcome and
//! panel data, by K-fold cross-validation (`select::cv_single`,
//! `select::cv_panel`) or by BIC / AIC / AICc (`select::ic_panel`).
//!
//! The binary (`sgl`) is a thin wrapper around this library so the core
//! logic is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod cv;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod ic;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod select;

pub use error::SglError;
pub use select::{
    CrossValidator, CvOptions, CvResult, IcOptions, IcResult, InformationCriterion, cv_panel,
    cv_single, ic_panel,
};

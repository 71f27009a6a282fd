//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - method variants (`MethodKind`, `PanelMethod`, `Effects`, `PanelLayout`)
//! - the validated `GroupIndex`
//! - coefficient sets (`Coefficients`, `Intercept`)
//! - selection knobs (`CvLoss`, `Criterion`)

pub mod types;

pub use types::*;

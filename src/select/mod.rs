//! Entry points: `cv_single`, `cv_panel` and `ic_panel`.

pub mod cv;
pub mod ic;
mod validate;

pub use cv::*;
pub use ic::*;

//! Fitted regularization paths.
//!
//! A path is kept as plain matrices so that the cross-validation and
//! information-criterion code can stay generic over the solver that
//! produced it.

pub mod path;

pub use path::*;

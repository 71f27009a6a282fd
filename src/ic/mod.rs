//! Information-criterion lambda selection (BIC / AIC / AICc).

pub mod engine;
pub mod penalty;

pub use engine::*;
pub use penalty::*;

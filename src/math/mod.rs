//! Numeric primitives: proximal operators, moments and spectral bounds.

pub mod moments;
pub mod prox;
pub mod spectral;

pub use moments::*;
pub use prox::*;
pub use spectral::*;

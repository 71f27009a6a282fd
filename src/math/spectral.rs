//! Spectral bounds for block step sizes.
//!
//! The block coordinate descent takes a gradient step of size `1 / L_g` on
//! each group, where `L_g` is the largest eigenvalue of `X_gᵀ X_g / n`.
//! Groups are small, so a dense symmetric eigendecomposition is cheap.

use nalgebra::{DMatrix, SymmetricEigen};

/// Largest eigenvalue of `xᵀx / n`. Zero for an all-zero block.
pub fn block_lipschitz(x: &DMatrix<f64>, n: usize) -> f64 {
    if x.ncols() == 0 || n == 0 {
        return 0.0;
    }
    let gram = (x.transpose() * x) / n as f64;
    if gram.ncols() == 1 {
        return gram[(0, 0)].max(0.0);
    }
    let eig = SymmetricEigen::new(gram);
    eig.eigenvalues.max().max(0.0)
}

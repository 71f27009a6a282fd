//! Proximal operators of the sparse-group penalty.
//!
//! The sparse-group penalty on one group is
//!
//! ```text
//! λ γ ‖β_g‖₁ + λ (1 - γ) w_g ‖β_g‖₂
//! ```
//!
//! and its proximal map factors into an elementwise soft-threshold followed
//! by a group-wise radial shrink.

/// Elementwise soft-threshold `sign(z) · max(|z| - t, 0)`.
pub fn soft_threshold(z: f64, t: f64) -> f64 {
    if z > t {
        z - t
    } else if z < -t {
        z + t
    } else {
        0.0
    }
}

/// Euclidean norm of a slice.
pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Apply the sparse-group proximal map to `z` in place.
///
/// `l1` is the elementwise threshold, `l2` the group threshold (both already
/// scaled by the step size).
pub fn sparse_group_prox(z: &mut [f64], l1: f64, l2: f64) {
    for v in z.iter_mut() {
        *v = soft_threshold(*v, l1);
    }
    let norm = l2_norm(z);
    if norm <= l2 || norm == 0.0 {
        z.iter_mut().for_each(|v| *v = 0.0);
        return;
    }
    let scale = 1.0 - l2 / norm;
    z.iter_mut().for_each(|v| *v *= scale);
}

/// Smallest `λ` for which the group with score vector `c` is zeroed out.
///
/// Solves `‖S(c, λγ)‖₂ = λ (1 - γ) w` for `λ`; the left side decreases and
/// the right side increases in `λ`, so bisection on a bracketing interval
/// converges.
pub fn group_zero_threshold(c: &[f64], gamma: f64, weight: f64) -> f64 {
    let max_abs = c.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if max_abs == 0.0 {
        return 0.0;
    }
    if gamma >= 1.0 || weight == 0.0 {
        return max_abs / gamma.max(f64::MIN_POSITIVE);
    }
    if gamma <= 0.0 {
        return l2_norm(c) / weight;
    }

    let excess = |lambda: f64| {
        let shrunk: f64 = c
            .iter()
            .map(|&v| soft_threshold(v, lambda * gamma).powi(2))
            .sum::<f64>()
            .sqrt();
        shrunk - lambda * (1.0 - gamma) * weight
    };

    let mut lo = 0.0;
    let mut hi = max_abs / gamma;
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if excess(mid) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= 1e-14 * hi {
            break;
        }
    }
    hi
}

//! Sample moments.

/// Arithmetic mean. Returns `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Variance about the mean with divisor `n`.
pub fn population_variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Standard error of the mean in the form
/// `sqrt(mean((v - m)²) / (n - 1))`.
///
/// Returns `(mean, standard error)`; both are `NaN` for an empty slice and the
/// standard error is `NaN` for a single value.
pub fn mean_and_standard_error(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let m = mean(values);
    if n == 1 {
        return (m, f64::NAN);
    }
    let spread = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64;
    (m, (spread / (n as f64 - 1.0)).sqrt())
}

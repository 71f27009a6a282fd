//! Complexity penalties for the information criteria.
//!
//! Scores are on the `mse / σ̂²` scale, so the penalties are the usual
//! `-2 log L` penalties divided by `n`:
//!
//! - BIC:  `ln(n) · df / n`
//! - AIC:  `2 · df / n`
//! - AICc: `AIC + 2 · df · (df + 1) / (n · (n - df - 1))`
//!
//! The exact constants are kept behind `IcPenalty` so an alternative
//! convention can be swapped in without touching the engine.

use crate::domain::Criterion;

/// Penalty term added to the normalized fit for one criterion.
pub trait IcPenalty: Sync {
    fn penalty(&self, criterion: Criterion, df: f64, n: usize) -> f64;
}

/// Standard BIC / AIC / AICc penalty shapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPenalty;

impl IcPenalty for StandardPenalty {
    fn penalty(&self, criterion: Criterion, df: f64, n: usize) -> f64 {
        let n_f = n as f64;
        match criterion {
            Criterion::Bic => n_f.ln() * df / n_f,
            Criterion::Aic => 2.0 * df / n_f,
            Criterion::Aicc => {
                let denom = n_f - df - 1.0;
                if denom <= 0.0 {
                    return f64::INFINITY;
                }
                2.0 * df / n_f + 2.0 * df * (df + 1.0) / (n_f * denom)
            }
        }
    }
}

//! Terminal summaries of cross-validation and information-criterion runs.
//!
//! Formatting lives here so the selection code stays free of presentation.

use crate::domain::{Coefficients, Criterion, Intercept};
use crate::select::{CvResult, IcResult};

/// Every `stride`-th lambda of the path is listed, plus the selected ones.
const PATH_STRIDE: usize = 10;

/// Full cross-validation summary: settings, picks, path table, coefficients.
pub fn format_cv_summary(cv: &CvResult, names: &[String]) -> String {
    let mut out = String::new();

    out.push_str("=== sgl - cross-validated sparse-group LASSO ===\n");
    out.push_str(&format!(
        "Method: {} | folds: {} | measure: {}\n",
        cv.method.label(),
        cv.foldid.nfolds(),
        cv.name
    ));
    out.push_str(&format!(
        "lambda_min = {:.6e} (index {}, nonzero {})\n",
        cv.lambda_min, cv.idx_min, cv.nzero[cv.idx_min]
    ));
    out.push_str(&format!(
        "lambda_1se = {:.6e} (index {}, nonzero {})\n",
        cv.lambda_1se, cv.idx_1se, cv.nzero[cv.idx_1se]
    ));

    out.push_str("\nPath:\n");
    out.push_str(
        format!(
            "  {:>5} {:>12} {:>12} {:>12} {:>7}\n",
            "idx", "lambda", "cvm", "cvsd", "nzero"
        )
        .trim_end(),
    );
    out.push('\n');
    for j in 0..cv.lambda.len() {
        let mark = if j == cv.idx_min {
            "min"
        } else if j == cv.idx_1se {
            "1se"
        } else if j % PATH_STRIDE == 0 {
            ""
        } else {
            continue;
        };
        out.push_str(
            format!(
                "  {:>5} {:>12.4e} {:>12.5} {:>12.5} {:>7} {mark}\n",
                j, cv.lambda[j], cv.cvm[j], cv.cvsd[j], cv.nzero[j]
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out.push_str("\nCoefficients at lambda_min:\n");
    out.push_str(&format_coefficients(&cv.lam_min, names));
    out.push_str("\nCoefficients at lambda_1se:\n");
    out.push_str(&format_coefficients(&cv.lam_1se, names));

    out
}

/// BIC / AIC / AICc picks and their coefficients.
pub fn format_ic_summary(ic: &IcResult, names: &[String]) -> String {
    let mut out = String::new();

    out.push_str("=== sgl - information-criterion sparse-group LASSO ===\n");
    out.push_str(&format!(
        "Method: {} | path length: {} | sigma^2 = {:.6}\n",
        ic.method.label(),
        ic.lambda.len(),
        ic.scores.sigsqhat
    ));

    for criterion in Criterion::ALL {
        let c = ic.choice(criterion);
        out.push_str(&format!(
            "\n{:<5} lambda = {:.6e} (index {}, df {}, score {:.6})\n",
            criterion.display_name(),
            c.lambda,
            c.index,
            ic.fit.df[c.index],
            c.score
        ));
        out.push_str(&format_coefficients(&c.coefficients, names));
    }

    out
}

/// Intercept(s) and the nonzero slopes of one coefficient set.
pub fn format_coefficients(coef: &Coefficients, names: &[String]) -> String {
    let mut out = String::new();
    match &coef.intercept {
        Intercept::Pooled(a) => out.push_str(&format!("  intercept: {a:.6}\n")),
        Intercept::Fixed(a) => out.push_str(&format!("  unit effects: {}\n", fmt_vec(a))),
    }

    let mut any = false;
    for (j, &b) in coef.beta.iter().enumerate() {
        if b == 0.0 {
            continue;
        }
        any = true;
        let name = names.get(j).cloned().unwrap_or_else(|| format!("x{}", j + 1));
        out.push_str(&format!("  {:<16} {b:>12.6}\n", truncate(&name, 16)));
    }
    if !any {
        out.push_str("  (all slopes zero)\n");
    }
    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.4}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

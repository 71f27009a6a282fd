//! CSV ingest of a response column and numeric covariates.
//!
//! Schema: one header row, one named response column, every other column is
//! a covariate in file order. Rows are kept in file order, which for panel
//! data must already be unit-block order.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use nalgebra::{DMatrix, DVector};

use crate::error::SglError;

/// A design matrix and response loaded from CSV.
#[derive(Debug, Clone)]
pub struct DesignData {
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
    /// Covariate names, one per column of `x`.
    pub covariates: Vec<String>,
}

/// Load `path`, taking `response` as the outcome column.
pub fn load_design_csv(path: &Path, response: &str) -> Result<DesignData, SglError> {
    let file = File::open(path).map_err(|e| {
        SglError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open CSV '{}': {e}", path.display()),
        ))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let header_map = build_header_map(&headers);
    let response_idx = *header_map
        .get(&normalize_header_name(response))
        .ok_or_else(|| {
            SglError::config(format!("Response column '{response}' not found in CSV header."))
        })?;

    let covariate_idx: Vec<usize> = (0..headers.len()).filter(|&i| i != response_idx).collect();
    if covariate_idx.is_empty() {
        return Err(SglError::data("CSV has no covariate columns besides the response."));
    }
    let covariates = covariate_idx
        .iter()
        .map(|&i| normalize_header_name(&headers[i]))
        .collect();

    let mut y = Vec::new();
    let mut values = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Data starts on line 2, after the header.
        let line = idx + 2;
        let record = result?;
        y.push(parse_cell(&record, response_idx, line)?);
        for &col in &covariate_idx {
            values.push(parse_cell(&record, col, line)?);
        }
    }

    let n = y.len();
    if n == 0 {
        return Err(SglError::data("CSV contains no data rows."));
    }
    log::info!(
        "Loaded {n} rows x {} covariates from '{}'",
        covariate_idx.len(),
        path.display()
    );

    Ok(DesignData {
        x: DMatrix::from_row_slice(n, covariate_idx.len(), &values),
        y: DVector::from_vec(y),
        covariates,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn parse_cell(record: &StringRecord, col: usize, line: usize) -> Result<f64, SglError> {
    let raw = record
        .get(col)
        .ok_or_else(|| SglError::data(format!("Line {line}: missing column {}.", col + 1)))?;
    let value: f64 = raw
        .parse()
        .map_err(|_| SglError::data(format!("Line {line}: '{raw}' is not a number.")))?;
    if !value.is_finite() {
        return Err(SglError::data(format!("Line {line}: non-finite value '{raw}'.")));
    }
    Ok(value)
}

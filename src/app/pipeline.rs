//! Shared run logic behind the `cv` and `ic` subcommands.
//!
//! Input loading -> group index -> method -> selection. Presentation stays
//! in `app` and `report`.

use nalgebra::{DMatrix, DVector};

use crate::cli::DataArgs;
use crate::data::{SampleConfig, generate_sample};
use crate::domain::{GroupIndex, PanelMethod};
use crate::error::SglError;
use crate::io::load_design_csv;
use crate::select::{CvOptions, CvResult, IcOptions, IcResult, cv_panel, ic_panel};

/// Resolved inputs of one run.
#[derive(Debug, Clone)]
pub struct RunInput {
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
    pub groups: GroupIndex,
    pub method: PanelMethod,
    /// Covariate names for reporting.
    pub names: Vec<String>,
}

/// Load the CSV or simulate a sample, then resolve groups and method.
pub fn load_input(args: &DataArgs) -> Result<RunInput, SglError> {
    let method = PanelMethod::from_parts(args.method, args.nf)?;

    let (x, y, names) = match (&args.csv, args.simulate) {
        (Some(path), false) => {
            let data = load_design_csv(path, &args.response)?;
            (data.x, data.y, data.covariates)
        }
        (None, true) => {
            let config = SampleConfig {
                n: args.n,
                p: args.p,
                // The true sparsity pattern follows the requested grouping
                // when it is contiguous.
                group_size: args.group_size.unwrap_or(SampleConfig::default().group_size),
                nf: method.units(),
                seed: args.seed,
                ..SampleConfig::default()
            };
            let sample = generate_sample(&config)?;
            log::info!(
                "Simulated n={} p={} with {} nonzero true coefficients (seed {})",
                config.n,
                config.p,
                sample.beta.iter().filter(|b| **b != 0.0).count(),
                config.seed
            );
            let names = (1..=config.p).map(|j| format!("x{j}")).collect();
            (sample.x, sample.y, names)
        }
        _ => {
            return Err(SglError::config(
                "Pass exactly one data source: --csv <FILE> or --simulate.",
            ));
        }
    };

    let p = x.ncols();
    let groups = match (&args.groups, args.group_size) {
        (Some(ids), None) => GroupIndex::new(ids.clone(), p)?,
        (None, Some(size)) => GroupIndex::contiguous(p, size)?,
        _ => {
            return Err(SglError::config(
                "Pass exactly one group index: --groups <IDS> or --group-size <K>.",
            ));
        }
    };

    Ok(RunInput {
        x,
        y,
        groups,
        method,
        names,
    })
}

pub fn run_cv(input: &RunInput, options: &CvOptions) -> Result<CvResult, SglError> {
    cv_panel(&input.x, &input.y, &input.groups, input.method, options)
}

pub fn run_ic(input: &RunInput, options: &IcOptions) -> Result<IcResult, SglError> {
    ic_panel(&input.x, &input.y, &input.groups, input.method, options)
}

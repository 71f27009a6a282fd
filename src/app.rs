//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main that parses
//! arguments, loads or simulates data, runs the selection and prints the
//! summary.

use clap::Parser;

use crate::cli::{Cli, Command, CvArgs, IcArgs, PathArgs};
use crate::error::SglError;
use crate::fit::SolverOptions;
use crate::select::{CvOptions, IcOptions};

pub mod pipeline;

/// Entry point for the `sgl` binary.
pub fn run() -> Result<(), SglError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Cv(args) => handle_cv(&args),
        Command::Ic(args) => handle_ic(&args),
    }
}

fn handle_cv(args: &CvArgs) -> Result<(), SglError> {
    let input = pipeline::load_input(&args.data)?;
    let options = cv_options_from_args(args);
    let cv = pipeline::run_cv(&input, &options)?;
    println!("{}", crate::report::format_cv_summary(&cv, &input.names));
    Ok(())
}

fn handle_ic(args: &IcArgs) -> Result<(), SglError> {
    let input = pipeline::load_input(&args.data)?;
    let options = ic_options_from_args(args);
    let ic = pipeline::run_ic(&input, &options)?;
    println!("{}", crate::report::format_ic_summary(&ic, &input.names));
    Ok(())
}

pub fn solver_options_from_args(args: &PathArgs) -> SolverOptions {
    SolverOptions {
        nlambda: args.nlambda,
        lambda_factor: args.lambda_factor,
        dfmax: args.dfmax,
        standardize: args.standardize,
        ..SolverOptions::default()
    }
}

pub fn cv_options_from_args(args: &CvArgs) -> CvOptions {
    CvOptions {
        lambda: args.path.lambda.clone(),
        gamma: args.path.gamma,
        nfolds: args.nfolds,
        foldid: args.foldid.clone(),
        loss: args.loss,
        parallel: !args.sequential,
        solver: solver_options_from_args(&args.path),
    }
}

pub fn ic_options_from_args(args: &IcArgs) -> IcOptions {
    IcOptions {
        lambda: args.path.lambda.clone(),
        gamma: args.path.gamma,
        solver: solver_options_from_args(&args.path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CvLoss;

    #[test]
    fn cv_arguments_map_onto_options() {
        let cli = Cli::parse_from([
            "sgl", "cv", "--simulate", "--nfolds", "5", "--sequential", "--dfmax", "8",
            "--loss", "absolute", "--group-size", "5",
        ]);
        let Command::Cv(args) = cli.command else {
            panic!("expected cv");
        };
        let options = cv_options_from_args(&args);
        assert_eq!(options.nfolds, 5);
        assert!(!options.parallel);
        assert_eq!(options.loss, CvLoss::Absolute);
        assert_eq!(options.solver.dfmax, Some(8));
        assert_eq!(options.solver.nlambda, 100);
    }
}

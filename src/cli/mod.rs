//! Command-line parsing for the `sgl` binary.
//!
//! Parsing and dispatch stay separate from the selection code; `app` maps
//! these arguments onto the library option structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{CvLoss, MethodKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "sgl",
    version,
    about = "Sparse-group LASSO tuning by cross-validation or information criteria"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Choose lambda by K-fold cross-validation (lambda_min and lambda_1se).
    Cv(CvArgs),
    /// Choose lambda by BIC, AIC and AICc on one full-data path.
    Ic(IcArgs),
}

/// Where the data come from and how covariates are grouped.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// CSV file with a header row.
    #[arg(long, value_name = "FILE", conflicts_with = "simulate", required_unless_present = "simulate")]
    pub csv: Option<PathBuf>,

    /// Response column in the CSV; every other column is a covariate.
    #[arg(long, default_value = "y")]
    pub response: String,

    /// Generate a synthetic grouped-sparse sample instead of reading a CSV.
    #[arg(long)]
    pub simulate: bool,

    /// Rows of the synthetic sample.
    #[arg(long, default_value_t = 100)]
    pub n: usize,

    /// Covariates of the synthetic sample.
    #[arg(long, default_value_t = 20)]
    pub p: usize,

    /// Random seed for the synthetic sample.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Explicit group id per covariate, e.g. `1,1,2,2,2`.
    #[arg(
        long,
        value_delimiter = ',',
        conflicts_with = "group_size",
        required_unless_present = "group_size"
    )]
    pub groups: Option<Vec<usize>>,

    /// Contiguous groups of this many covariates.
    #[arg(long)]
    pub group_size: Option<usize>,

    /// Estimation method.
    #[arg(long, value_enum, default_value_t = MethodKind::Single)]
    pub method: MethodKind,

    /// Number of cross-sectional units (rows come in `nf` equal blocks).
    #[arg(long)]
    pub nf: Option<usize>,
}

/// Penalty and path options shared by both subcommands.
#[derive(Debug, Args, Clone)]
pub struct PathArgs {
    /// Mixing weight: 1 is the LASSO, 0 the group LASSO.
    #[arg(long, default_value_t = 1.0)]
    pub gamma: f64,

    /// Explicit lambda grid, e.g. `0.5,0.1,0.01`. Re-sorted descending.
    #[arg(long, value_delimiter = ',')]
    pub lambda: Option<Vec<f64>>,

    /// Length of the synthesized lambda grid.
    #[arg(long, default_value_t = 100)]
    pub nlambda: usize,

    /// Ratio of the smallest to the largest synthesized lambda.
    #[arg(long)]
    pub lambda_factor: Option<f64>,

    /// Stop the path once more than this many coefficients are nonzero.
    #[arg(long)]
    pub dfmax: Option<usize>,

    /// Scale covariates to unit variance before fitting.
    #[arg(long)]
    pub standardize: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CvArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub path: PathArgs,

    /// Number of folds (at least 3).
    #[arg(long, default_value_t = 10)]
    pub nfolds: usize,

    /// Explicit 1-based fold id per row, e.g. `1,2,3,1,2,3`.
    #[arg(long, value_delimiter = ',')]
    pub foldid: Option<Vec<usize>>,

    /// Per-observation loss aggregated across folds.
    #[arg(long, value_enum, default_value_t = CvLoss::Residual)]
    pub loss: CvLoss,

    /// Fit folds one after another instead of on the thread pool.
    #[arg(long)]
    pub sequential: bool,
}

#[derive(Debug, Args, Clone)]
pub struct IcArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub path: PathArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cv_with_simulated_panel() {
        let cli = Cli::parse_from([
            "sgl", "cv", "--simulate", "--method", "fe", "--nf", "10", "--gamma", "0.5",
            "--loss", "squared", "--group-size", "5",
        ]);
        let Command::Cv(args) = cli.command else {
            panic!("expected cv");
        };
        assert!(args.data.simulate);
        assert_eq!(args.data.method, MethodKind::Fe);
        assert_eq!(args.data.nf, Some(10));
        assert_eq!(args.loss, CvLoss::Squared);
        assert_eq!(args.nfolds, 10);
        assert_eq!(args.data.group_size, Some(5));
        assert_eq!(args.data.groups, None);
    }

    #[test]
    fn parses_ic_with_groups_and_grid() {
        let cli = Cli::parse_from([
            "sgl", "ic", "--csv", "data.csv", "--groups", "1,1,2", "--lambda", "0.1,0.5",
        ]);
        let Command::Ic(args) = cli.command else {
            panic!("expected ic");
        };
        assert_eq!(args.data.groups, Some(vec![1, 1, 2]));
        assert_eq!(args.path.lambda, Some(vec![0.1, 0.5]));
    }

    #[test]
    fn data_source_is_required() {
        assert!(Cli::try_parse_from(["sgl", "ic", "--group-size", "5"]).is_err());
    }

    #[test]
    fn group_index_must_be_given_explicitly() {
        assert!(Cli::try_parse_from(["sgl", "cv", "--simulate"]).is_err());
        assert!(
            Cli::try_parse_from(["sgl", "cv", "--simulate", "--groups", "1,2", "--group-size", "2"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["sgl", "cv", "--simulate", "--group-size", "4"]).is_ok());
    }
}

//! dxclass: Diagnostic Classification CLI Tool
//!
//! Explores the AIBL cohort, compares classifiers with stratified
//! cross-validation, and evaluates one classifier on a holdout split.

use anyhow::Result;
use clap::Parser;

use dxclass::cli::{compare::run_compare, evaluate::run_evaluate, explore::run_explore, Cli, Commands};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Explore(args) => run_explore(args),
        Commands::Compare(args) => run_compare(args),
        Commands::Evaluate(args) => run_evaluate(args),
    }
}

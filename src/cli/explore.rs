//! `explore`: dataset summaries and the AD vs non-AD statistics table

use anyhow::{Context, Result};

use super::args::ExploreArgs;
use super::steps::load_and_derive;
use crate::pipeline::{describe, label_counts, missing_summary, statistics_table};
use crate::report::{
    display_describe, display_label_counts, display_missing, display_statistics,
    export_statistics_csv, output_path,
};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_step_header, print_success, ConfigCard,
};

pub fn run_explore(args: &ExploreArgs) -> Result<()> {
    let common = &args.common;
    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&ConfigCard {
        command: "explore",
        input: &common.input,
        target: "DXTYPE (AD vs non-AD statistics)",
        output: &common.output_dir,
        settings: vec![("Derived format", common.derived_format.extension().to_string())],
    });

    let derived = load_and_derive(common)?;

    print_step_header(3, "Exploratory Statistics");
    let spinner = create_spinner("Summarising columns...");
    let summaries = describe(&derived.frame)?;
    let missing = missing_summary(&derived.frame);
    let counts = label_counts(&derived.frame)?;
    let statistics = statistics_table(&derived.frame)
        .context("Failed to compute the AD vs non-AD statistics table")?;
    finish_with_success(&spinner, "Statistics computed");

    display_missing(&missing);
    display_describe(&summaries);
    display_label_counts(&counts, &derived.quality);
    display_statistics(&statistics);

    print_step_header(4, "Save Results");
    let stats_path = output_path(&common.output_dir, &common.input, "statistics.csv");
    export_statistics_csv(&statistics, &stats_path)?;
    print_success(&format!("Statistics saved to {}", stats_path.display()));

    print_completion("explore");
    Ok(())
}

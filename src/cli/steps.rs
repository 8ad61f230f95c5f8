//! Steps shared by every command: load, derive and persist the derived table

use std::fs;
use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use super::args::CommonArgs;
use crate::pipeline::{derive_table, load_dataset_with_progress, DerivedTable};
use crate::report::{output_path, save_dataset};
use crate::utils::{
    create_spinner, finish_with_success, print_count, print_info, print_step_header, print_success,
    print_warning,
};

/// Load the input, derive `DXTYPE` and `ExamAge` and persist the derived
/// table, as steps 1 and 2
pub fn load_and_derive(common: &CommonArgs) -> Result<DerivedTable> {
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let (raw, rows, cols, memory_mb) =
        load_dataset_with_progress(&common.input, common.infer_schema_length)?;
    print_success("Dataset loaded");

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!("      Estimated memory: {:.2} MB", memory_mb);
    print_info(&format!("Loaded in {:.2}s", step_start.elapsed().as_secs_f64()));

    print_step_header(2, "Derive Labels and Features");
    let derived = derive_table(&raw)
        .with_context(|| format!("Failed to derive labels from {}", common.input.display()))?;

    let counts = derived.quality.class_counts;
    print_count(
        "diagnosed row(s)",
        counts.iter().sum(),
        Some(&format!(
            "(Normal {}, MCI {}, AD {})",
            counts[0], counts[1], counts[2]
        )),
    );
    if derived.quality.undiagnosed > 0 {
        print_warning(&format!(
            "{} row(s) have no diagnosis indicator set (DXTYPE = -1)",
            derived.quality.undiagnosed
        ));
    }
    if derived.quality.multi_flag > 0 {
        print_warning(&format!(
            "{} row(s) have several diagnosis indicators set; resolved as Normal > MCI > AD",
            derived.quality.multi_flag
        ));
    }
    if derived.derivation.age_derived {
        print_success("ExamAge derived from Examyear - PTDOBYear");
    } else {
        print_warning("Examyear or PTDOBYear missing; ExamAge not derived");
    }
    if !derived.derivation.dropped_columns.is_empty() {
        print_info(&format!(
            "Dropped {}",
            derived.derivation.dropped_columns.join(", ")
        ));
    }
    save_derived(common, &derived)?;

    Ok(derived)
}

/// Write the derived table, sentinel rows included
fn save_derived(common: &CommonArgs, derived: &DerivedTable) -> Result<()> {
    fs::create_dir_all(&common.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            common.output_dir.display()
        )
    })?;
    let path = output_path(
        &common.output_dir,
        &common.input,
        &format!("derived.{}", common.derived_format.extension()),
    );
    let spinner = create_spinner("Writing derived table...");
    let mut frame = derived.frame.clone();
    save_dataset(&mut frame, &path)?;
    finish_with_success(&spinner, &format!("Derived table saved to {}", path.display()));
    Ok(())
}

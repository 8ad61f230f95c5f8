//! Console tables for exploration and cross-validation results

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{
    ColumnSummary, CvOutcome, LabelQuality, ModelEvaluation, Scorer, StatisticsRow, TargetKind,
};

fn section_title(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.*}", precision, v))
}

/// Numeric column summaries
pub fn display_describe(summaries: &[ColumnSummary]) {
    section_title("📐", "COLUMN SUMMARY");
    let mut table = new_table(&["Column", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"]);
    for s in summaries {
        table.add_row(vec![
            Cell::new(&s.name),
            Cell::new(s.count).set_alignment(CellAlignment::Right),
            Cell::new(fmt_opt(s.mean, 3)).set_alignment(CellAlignment::Right),
            Cell::new(fmt_opt(s.std, 3)).set_alignment(CellAlignment::Right),
            Cell::new(fmt_opt(s.min, 2)).set_alignment(CellAlignment::Right),
            Cell::new(fmt_opt(s.q25, 2)).set_alignment(CellAlignment::Right),
            Cell::new(fmt_opt(s.median, 2)).set_alignment(CellAlignment::Right),
            Cell::new(fmt_opt(s.q75, 2)).set_alignment(CellAlignment::Right),
            Cell::new(fmt_opt(s.max, 2)).set_alignment(CellAlignment::Right),
        ]);
    }
    print_indented(&table);
}

/// Columns with at least one missing value
pub fn display_missing(summary: &[(String, usize, f64)]) {
    section_title("🕳️ ", "MISSING VALUES");
    let with_missing: Vec<_> = summary.iter().filter(|(_, n, _)| *n > 0).collect();
    if with_missing.is_empty() {
        println!("      {}", style("No missing values").green());
        return;
    }
    let mut table = new_table(&["Column", "Missing", "Ratio"]);
    for (name, count, ratio) in with_missing {
        let color = if *ratio > 0.3 { Color::Red } else { Color::Yellow };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(count).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}%", ratio * 100.0)).fg(color),
        ]);
    }
    print_indented(&table);
}

/// `DXTYPE` value counts with the data-quality anomalies
pub fn display_label_counts(counts: &[(i64, usize)], quality: &LabelQuality) {
    section_title("🏷️ ", "DXTYPE VALUE COUNTS");
    let mut table = new_table(&["DXTYPE", "Diagnosis", "Rows"]);
    for (code, count) in counts {
        let name = if *code < 0 {
            "Undiagnosed".to_string()
        } else {
            TargetKind::Diagnosis.class_name(*code)
        };
        table.add_row(vec![
            Cell::new(code),
            Cell::new(name),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    print_indented(&table);
    if quality.multi_flag > 0 {
        println!(
            "      {} {} row(s) had several indicators set",
            style("!").yellow().bold(),
            quality.multi_flag
        );
    }
}

/// AD versus non-AD comparison table
pub fn display_statistics(rows: &[StatisticsRow]) {
    section_title("📊", "AD vs NON-AD STATISTICS");
    let mut table = new_table(&[
        "Feature",
        "Mean AD",
        "Mean non-AD",
        "t-test p",
        "Pearson r",
        "P(AD)",
        "P(non-AD)",
    ]);
    for row in rows {
        let significant = row.t_test_p_value.is_some_and(|p| p < 0.05);
        table.add_row(vec![
            Cell::new(&row.feature).add_attribute(Attribute::Bold),
            Cell::new(fmt_opt(row.mean_ad, 2)),
            Cell::new(fmt_opt(row.mean_non_ad, 2)),
            Cell::new(fmt_opt(row.t_test_p_value, 4)).fg(if significant {
                Color::Green
            } else {
                Color::White
            }),
            Cell::new(fmt_opt(row.pearson, 3)),
            Cell::new(format!("{:.3}", row.probability_ad)),
            Cell::new(format!("{:.3}", row.probability_non_ad)),
        ]);
    }
    print_indented(&table);
}

/// One row per estimator: mean ± std for each scorer, then wall-clock time
pub fn display_cv_results(evaluations: &[ModelEvaluation], scorers: &[Scorer], folds: usize) {
    section_title("🧪", &format!("{}-FOLD CROSS-VALIDATION", folds));

    let mut headers = vec!["Model".to_string()];
    headers.extend(scorers.iter().map(|s| s.display_name().to_string()));
    headers.push("Time (s)".to_string());
    let header_refs: Vec<&str> = headers.iter().map(|s| s.as_str()).collect();
    let mut table = new_table(&header_refs);

    let best = scorers.first().and_then(|&primary| {
        evaluations
            .iter()
            .filter_map(|e| e.summary(primary).map(|s| s.mean))
            .fold(None, |best: Option<f64>, m| Some(best.map_or(m, |b| b.max(m))))
    });

    for evaluation in evaluations {
        let mut row = vec![Cell::new(&evaluation.name).add_attribute(Attribute::Bold)];
        match &evaluation.outcome {
            CvOutcome::Completed { .. } => {
                for (i, &scorer) in scorers.iter().enumerate() {
                    let cell = match evaluation.summary(scorer) {
                        Some(s) => {
                            let cell = Cell::new(format!("{:.4} ± {:.4}", s.mean, s.std));
                            if i == 0 && best == Some(s.mean) {
                                cell.fg(Color::Green).add_attribute(Attribute::Bold)
                            } else {
                                cell
                            }
                        }
                        None => Cell::new("-"),
                    };
                    row.push(cell);
                }
            }
            CvOutcome::Failed { fold, reason } => {
                row.push(Cell::new(format!("FAILED (fold {}): {}", fold + 1, reason)).fg(Color::Red));
                for _ in 1..scorers.len() {
                    row.push(Cell::new("-"));
                }
            }
        }
        row.push(Cell::new(format!("{:.2}", evaluation.elapsed_secs)).set_alignment(CellAlignment::Right));
        table.add_row(row);
    }

    print_indented(&table);
}

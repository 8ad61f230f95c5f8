//! Holdout evaluation tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;
use serde::Serialize;

use crate::pipeline::{ClassMetrics, ClassificationReport, ConfusionMatrix, MetricSummary};

/// Everything measured on the held-out rows after the final fit
#[derive(Debug, Clone, Serialize)]
pub struct HoldoutEvaluation {
    pub metrics: MetricSummary,
    /// Display names indexed by encoded class
    pub class_names: Vec<String>,
    pub classification_report: ClassificationReport,
    pub confusion_matrix: ConfusionMatrix,
}

impl HoldoutEvaluation {
    pub fn new(
        metrics: MetricSummary,
        class_names: Vec<String>,
        confusion_matrix: ConfusionMatrix,
    ) -> Self {
        let classification_report = ClassificationReport::from_confusion(&confusion_matrix);
        Self {
            metrics,
            class_names,
            classification_report,
            confusion_matrix,
        }
    }
}

fn print_table(title: &str, table: &Table) {
    println!();
    println!("    {} {}", style("📋").cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn metric_row(label: &str, m: &ClassMetrics) -> Vec<Cell> {
    vec![
        Cell::new(label).add_attribute(Attribute::Bold),
        Cell::new(format!("{:.4}", m.precision)).set_alignment(CellAlignment::Right),
        Cell::new(format!("{:.4}", m.recall)).set_alignment(CellAlignment::Right),
        Cell::new(format!("{:.4}", m.f1)).set_alignment(CellAlignment::Right),
        Cell::new(m.support).set_alignment(CellAlignment::Right),
    ]
}

/// Headline metrics, the per-class report and the confusion matrix
pub fn display_holdout(evaluation: &HoldoutEvaluation) {
    let m = &evaluation.metrics;
    let mut headline = Table::new();
    headline.load_preset(UTF8_FULL_CONDENSED);
    headline.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    let auc = m
        .roc_auc_ovo
        .map_or_else(|| "undefined".to_string(), |v| format!("{:.4}", v));
    for (name, value) in [
        ("ROC AUC (OvO)", auc),
        ("Accuracy", format!("{:.4}", m.accuracy)),
        ("F1 (weighted)", format!("{:.4}", m.f1_weighted)),
        ("Precision (weighted)", format!("{:.4}", m.precision_weighted)),
        ("Recall (weighted)", format!("{:.4}", m.recall_weighted)),
    ] {
        headline.add_row(vec![
            Cell::new(name),
            Cell::new(value)
                .fg(Color::Green)
                .set_alignment(CellAlignment::Right),
        ]);
    }
    print_table("HOLDOUT METRICS", &headline);

    let report = &evaluation.classification_report;
    let mut per_class = Table::new();
    per_class.load_preset(UTF8_FULL_CONDENSED);
    per_class.set_header(
        ["Class", "Precision", "Recall", "F1", "Support"]
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    for (name, metrics) in evaluation.class_names.iter().zip(&report.per_class) {
        per_class.add_row(metric_row(name, metrics));
    }
    per_class.add_row(vec![
        Cell::new("accuracy").add_attribute(Attribute::Italic),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format!("{:.4}", report.accuracy)).set_alignment(CellAlignment::Right),
        Cell::new(evaluation.confusion_matrix.total()).set_alignment(CellAlignment::Right),
    ]);
    per_class.add_row(metric_row("macro avg", &report.macro_avg));
    per_class.add_row(metric_row("weighted avg", &report.weighted_avg));
    print_table("CLASSIFICATION REPORT", &per_class);

    let mut confusion = Table::new();
    confusion.load_preset(UTF8_FULL_CONDENSED);
    let mut header = vec![Cell::new("true \\ predicted").add_attribute(Attribute::Dim)];
    header.extend(
        evaluation
            .class_names
            .iter()
            .map(|n| Cell::new(n).add_attribute(Attribute::Bold)),
    );
    confusion.set_header(header);
    for (i, row) in evaluation.confusion_matrix.counts.iter().enumerate() {
        let name = evaluation.class_names.get(i).map_or("?", |s| s.as_str());
        let mut cells = vec![Cell::new(name).add_attribute(Attribute::Bold)];
        cells.extend(row.iter().enumerate().map(|(j, &count)| {
            let cell = Cell::new(count).set_alignment(CellAlignment::Right);
            if i == j {
                cell.fg(Color::Green)
            } else if count > 0 {
                cell.fg(Color::Red)
            } else {
                cell
            }
        }));
        confusion.add_row(cells);
    }
    print_table("CONFUSION MATRIX", &confusion);
}

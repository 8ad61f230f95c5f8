//! Terminal styling for the step-by-step console layout

use console::{style, Emoji};
use std::path::Path;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static DICE: Emoji<'_, '_> = Emoji("🎲 ", "");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");

const BOX_WIDTH: usize = 56;

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
     ____  __  __      _
    |  _ \ \ \/ /  ___| | __ _ ___ ___
    | | | | \  /  / __| |/ _` / __/ __|
    | |_| | /  \ | (__| | (_| \__ \__ \
    |____/ /_/\_\ \___|_|\__,_|___/___/
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {} {}",
        style("Dx").magenta().bold(),
        style("Diagnostic classification for the AIBL cohort").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Settings shown in the configuration card
pub struct ConfigCard<'a> {
    pub command: &'a str,
    pub input: &'a Path,
    pub target: &'a str,
    pub output: &'a Path,
    /// Extra `(label, value)` lines below the separator
    pub settings: Vec<(&'a str, String)>,
}

/// Print configuration card
pub fn print_config(card: &ConfigCard<'_>) {
    let line = "─".repeat(BOX_WIDTH - 2);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style(format!("⚙️  Configuration: {}", card.command)).cyan().bold(),
        " ".repeat((BOX_WIDTH - 21).saturating_sub(card.command.len()))
    );
    println!("    ├{}┤", line);
    println!("    │  {} Input:  {:<39}│", FOLDER, truncate_path(card.input, 38));
    println!("    │  {} Target: {:<39}│", TARGET, truncate_string(card.target, 38));
    println!("    │  {} Output: {:<39}│", SAVE, truncate_path(card.output, 38));
    if !card.settings.is_empty() {
        println!("    ├{}┤", line);
        for (label, value) in &card.settings {
            println!(
                "    │  {} {:<22} {:<24}│",
                CHART,
                format!("{}:", label),
                style(truncate_string(value, 24)).yellow()
            );
        }
    }
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print a data-quality warning to stderr
pub fn print_warning(message: &str) {
    eprintln!("    {} {}", WARN, style(message).yellow());
}

/// Print the seed in use, so a run can be repeated
pub fn print_seed(seed: u64) {
    println!("    {} Seed {}", DICE, style(seed).yellow().bold());
}

/// Print the final completion message
pub fn print_completion(command: &str) {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style(format!("dxclass {} complete!", command)).green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(info) = detail {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!("      Found {} {}", style(count).yellow().bold(), description);
    }
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_strings() {
        assert_eq!(truncate_string("AIBL.csv", 38), "AIBL.csv");
    }

    #[test]
    fn test_truncate_keeps_the_tail() {
        let out = truncate_string("/very/long/path/to/the/AIBL.csv", 12);
        assert_eq!(out, ".../AIBL.csv");
        assert_eq!(out.chars().count(), 12);
    }
}

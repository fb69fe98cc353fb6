use colored::*;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::time::Duration;

use crate::database::postgres::RunRecord;
use crate::migrate::engine::{MigrationReport, TableOutcome};
use crate::migrate::plan::Table;
use crate::reconcile::ReconcileReport;

const RULE_TOP: &str = "┌──────────────────────────────────────────────────────────────────────┐";
const RULE_MID: &str = "├──────────────────────────────────────────────────────────────────────┤";
const RULE_BOTTOM: &str = "└──────────────────────────────────────────────────────────────────────┘";

// Styled progress bar creation
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.blue} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

// Styled progress bar for overall progress
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let progress_bar = ProgressBar::new(total);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg}\n{wide_bar:.cyan/blue} {pos}/{len} [{elapsed_precise}] [{per_sec}] {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    progress_bar.set_message(message.to_string());
    progress_bar.enable_steady_tick(Duration::from_millis(100));
    progress_bar
}

pub fn create_multi_progress() -> MultiProgress {
    MultiProgress::new()
}

pub fn format_transfer_speed(records: u32, elapsed_secs: f64) -> String {
    if elapsed_secs < 0.001 {
        return "N/A".to_string();
    }
    let records_per_sec = records as f64 / elapsed_secs;
    if records_per_sec >= 1000.0 {
        format!("{:.2} K records/s", records_per_sec / 1000.0)
    } else {
        format!("{:.2} records/s", records_per_sec)
    }
}

// Function to print banner and initialize UI
pub fn init_ui() {
    println!(
        "{} {} {}",
        "🚀".green(),
        "HRIS Legacy Migration Tool".bold().blue(),
        "🚀".green()
    );
    println!("{}", "Connecting and preparing for migration...".yellow());
}

fn header(title: &str) {
    println!("{}", RULE_TOP.bright_blue());
    println!(
        "{} {} {}",
        "│".bright_blue(),
        format!(" {:<67}", title).bold().white().on_blue(),
        "│".bright_blue()
    );
    println!("{}", RULE_MID.bright_blue());
}

pub fn print_migration_summary(report: &MigrationReport) {
    let title = if report.dry_run {
        "🧪 DRY RUN SUMMARY (nothing written)"
    } else {
        "✅ MIGRATION RESULTS SUMMARY"
    };
    header(title);
    println!(
        "{} {:<16} {:>8} {:>9} {:>8} {:>8} {:>7} {:>8} {}",
        "│".bright_blue(),
        "Table".bold(),
        "Read".bold(),
        "Inserted".bold(),
        "Updated".bold(),
        "Skipped".bold(),
        "Failed".bold(),
        "Time".bold(),
        "│".bright_blue()
    );
    println!("{}", RULE_MID.bright_blue());

    for table in &report.tables {
        let name = table.table.target_name();
        match table.outcome {
            TableOutcome::SourceMissing => {
                println!(
                    "{} {:<16} {:<50} {}",
                    "│".bright_blue(),
                    name.cyan(),
                    format!("legacy table {} not found", table.table.legacy_name()).yellow(),
                    "│".bright_blue()
                );
            }
            TableOutcome::Migrated | TableOutcome::DryRun => {
                let (inserted, updated) = if report.dry_run {
                    (table.would_write.to_string(), "-".to_string())
                } else {
                    (table.inserted.to_string(), table.updated.to_string())
                };
                let failed = if table.failed > 0 {
                    table.failed.to_string().red().bold()
                } else {
                    table.failed.to_string().green()
                };
                println!(
                    "{} {:<16} {:>8} {:>9} {:>8} {:>8} {:>7} {:>8} {}",
                    "│".bright_blue(),
                    name.cyan(),
                    table.read,
                    inserted.green(),
                    updated.green(),
                    table.skipped.to_string().yellow(),
                    failed,
                    format!("{:.2}s", table.elapsed_secs),
                    "│".bright_blue()
                );
            }
        }
    }
    println!("{}", RULE_MID.bright_blue());
    println!(
        "{} {:<30} {:<37} {}",
        "│".bright_blue(),
        "Total time:".bold(),
        format!("{:.2}s", report.elapsed_secs).yellow().bold(),
        "│".bright_blue()
    );
    println!("{}", RULE_BOTTOM.bright_blue());

    for table in &report.tables {
        for unresolved in &table.unresolved {
            println!(
                "{} {} → {}: {} unknown code(s) in {} row(s), e.g. {}",
                "↪".cyan(),
                table.table.target_name().cyan(),
                unresolved.table.target_name(),
                unresolved.distinct_codes.to_string().yellow(),
                unresolved.occurrences.to_string().yellow(),
                unresolved.sample.join(", ")
            );
        }
        for error in &table.error_sample {
            println!("{} {}: {}", "✗".red(), table.table.target_name().cyan(), error);
        }
    }
}

pub fn print_reconcile_report(report: &ReconcileReport) {
    header("🔍 RECONCILIATION REPORT");
    println!(
        "{} {:<16} {:>8} {:>8} {:>8} {:>7} {:>6} {:>8} {}",
        "│".bright_blue(),
        "Table".bold(),
        "Legacy".bold(),
        "Target".bold(),
        "Missing".bold(),
        "Extra".bold(),
        "Dupes".bold(),
        "Orphans".bold(),
        "│".bright_blue()
    );
    println!("{}", RULE_MID.bright_blue());
    for table in &report.tables {
        let missing = if table.keys.missing_in_target > 0 {
            table.keys.missing_in_target.to_string().red().bold()
        } else {
            table.keys.missing_in_target.to_string().green()
        };
        println!(
            "{} {:<16} {:>8} {:>8} {:>8} {:>7} {:>6} {:>8} {}",
            "│".bright_blue(),
            table.table.target_name().cyan(),
            table.keys.legacy_rows,
            table.keys.target_rows,
            missing,
            table.keys.extra_in_target,
            table.keys.duplicate_legacy_keys,
            table.orphan_references(),
            "│".bright_blue()
        );
    }
    println!("{}", RULE_BOTTOM.bright_blue());

    for table in &report.tables {
        if !table.keys.missing_sample.is_empty() {
            println!(
                "{} {} missing: {}",
                "↪".cyan(),
                table.table.target_name().cyan(),
                table.keys.missing_sample.join(", ")
            );
        }
        for unresolved in &table.unresolved {
            println!(
                "{} {} → {}: {}",
                "↪".cyan(),
                table.table.target_name().cyan(),
                unresolved.table.target_name(),
                unresolved.sample.join(", ")
            );
        }
    }

    if report.is_consistent() {
        println!("{}", "🎉 Legacy and target databases agree! 🎉".green().bold());
    } else {
        println!("{}", "⚠️  Legacy rows are missing from the target".yellow().bold());
    }
}

/// Row counts per table. `None` means the table does not exist on that side.
pub fn print_table_counts(title: &str, counts: &[(Table, &'static str, Option<i64>)]) {
    header(title);
    for (table, name, count) in counts {
        let shown = match count {
            Some(n) => n.to_string().green(),
            None => "missing".yellow().bold(),
        };
        println!(
            "{} {:<16} {:<16} {:>34} {}",
            "│".bright_blue(),
            table.target_name().cyan(),
            name,
            shown,
            "│".bright_blue()
        );
    }
    println!("{}", RULE_BOTTOM.bright_blue());
}

pub fn print_runs(runs: &[RunRecord]) {
    header("📒 LATEST MIGRATION RUNS");
    if runs.is_empty() {
        println!("{} {:<68} {}", "│".bright_blue(), "No runs recorded yet", "│".bright_blue());
    }
    for run in runs {
        let status = match run.status.as_str() {
            "COMPLETED" => run.status.green(),
            "FAILED" => run.status.red().bold(),
            _ => run.status.yellow(),
        };
        println!(
            "{} {:<16} {:<10} {:<20} {:>6} ins {:>6} upd {:>5} fail {}",
            "│".bright_blue(),
            run.table_name.cyan(),
            status,
            run.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            run.inserted,
            run.updated,
            run.failed,
            "│".bright_blue()
        );
    }
    println!("{}", RULE_BOTTOM.bright_blue());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_speed_switches_units() {
        assert_eq!(format_transfer_speed(10, 0.0), "N/A");
        assert_eq!(format_transfer_speed(500, 1.0), "500.00 records/s");
        assert_eq!(format_transfer_speed(5000, 2.0), "2.50 K records/s");
    }
}

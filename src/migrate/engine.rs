use anyhow::Result;
use colored::*;
use futures_util::future::try_join;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::database::connection::Connections;
use crate::database::mysql::{self, LegacyQuery};
use crate::database::postgres::{self, RunCounts};
use crate::database::schema::ensure_target_schema;
use crate::error::RowError;
use crate::migrate::lookup::{Lookups, UnresolvedSummary};
use crate::migrate::plan::{Plan, Table};
use crate::migrate::transform::Transform;
use crate::migrate::upsert::{upsert_rows, Upsert, UpsertOutcome};
use crate::models::*;
use crate::ui::{create_multi_progress, create_progress_bar, create_spinner};

#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub dry_run: bool,
    pub batch_size: usize,
    /// How many error messages and unresolved codes each table report keeps.
    pub sample: usize,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        MigrateOptions {
            dry_run: false,
            batch_size: crate::config::DEFAULT_BATCH_SIZE,
            sample: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableOutcome {
    Migrated,
    DryRun,
    #[serde(rename = "skipped_table")]
    SourceMissing,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub table: Table,
    pub outcome: TableOutcome,
    pub read: usize,
    pub inserted: u32,
    pub updated: u32,
    pub would_write: usize,
    pub skipped: usize,
    pub failed: usize,
    pub unresolved: Vec<UnresolvedSummary>,
    pub error_sample: Vec<String>,
    pub elapsed_secs: f64,
}

impl TableReport {
    fn source_missing(table: Table) -> Self {
        TableReport {
            table,
            outcome: TableOutcome::SourceMissing,
            read: 0,
            inserted: 0,
            updated: 0,
            would_write: 0,
            skipped: 0,
            failed: 0,
            unresolved: Vec::new(),
            error_sample: Vec::new(),
            elapsed_secs: 0.0,
        }
    }

    /// Every row read is accounted for exactly once.
    pub fn is_balanced(&self) -> bool {
        let written = match self.outcome {
            TableOutcome::DryRun => self.would_write,
            _ => (self.inserted + self.updated) as usize,
        };
        self.read == written + self.skipped + self.failed
    }

    fn counts(&self) -> RunCounts {
        let clamp = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
        RunCounts {
            read: clamp(self.read),
            inserted: clamp(self.inserted as usize),
            updated: clamp(self.updated as usize),
            skipped: clamp(self.skipped),
            failed: clamp(self.failed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub dry_run: bool,
    pub tables: Vec<TableReport>,
    pub elapsed_secs: f64,
}

impl MigrationReport {
    pub fn total_failed(&self) -> usize {
        self.tables.iter().map(|t| t.failed).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.tables.iter().map(|t| t.skipped).sum()
    }
}

/// Result of running the transform over a whole legacy table. Every entry keeps
/// the legacy key of the row it came from.
#[derive(Debug)]
pub struct Transformed<T> {
    pub rows: Vec<(String, T)>,
    pub skipped: Vec<(String, RowError)>,
    pub failed: Vec<(String, RowError)>,
}

pub fn transform_all<L: Transform>(legacy: &[L], lookups: &mut Lookups) -> Transformed<L::Target> {
    let mut transformed = Transformed {
        rows: Vec::with_capacity(legacy.len()),
        skipped: Vec::new(),
        failed: Vec::new(),
    };
    for row in legacy {
        match row.transform(lookups) {
            Ok(target) => transformed.rows.push((row.key(), target)),
            Err(err) if err.is_skip() => transformed.skipped.push((row.key(), err)),
            Err(err) => transformed.failed.push((row.key(), err)),
        }
    }
    transformed
}

/// Folds transform and write results into one report.
pub fn build_report<T>(
    table: Table,
    read: usize,
    transformed: &Transformed<T>,
    written: Option<&UpsertOutcome>,
    lookups: &Lookups,
    sample: usize,
    elapsed_secs: f64,
) -> TableReport {
    let write_failures = written.map(|w| w.failed.as_slice()).unwrap_or_default();
    let error_sample = transformed
        .failed
        .iter()
        .chain(write_failures)
        .take(sample)
        .map(|(key, err)| format!("{}: {}", key, err))
        .collect();

    TableReport {
        table,
        outcome: if written.is_some() {
            TableOutcome::Migrated
        } else {
            TableOutcome::DryRun
        },
        read,
        inserted: written.map_or(0, |w| w.inserted),
        updated: written.map_or(0, |w| w.updated),
        would_write: transformed.rows.len(),
        skipped: transformed.skipped.len(),
        failed: transformed.failed.len() + write_failures.len(),
        unresolved: lookups.unresolved_summary(sample),
        error_sample,
        elapsed_secs,
    }
}

pub async fn run_migration(
    conns: &mut Connections,
    plan: &Plan,
    options: &MigrateOptions,
) -> Result<MigrationReport> {
    let overall_start = Instant::now();

    if !options.dry_run {
        let spinner = create_spinner("Ensuring target schema...");
        ensure_target_schema(&conns.postgres).await?;
        spinner.finish_with_message("✅ Target schema ready");
    }

    let legacy_tables = mysql::existing_tables(&mut conns.mysql).await?;
    for dep in plan.external_dependencies() {
        info!(table = %dep, "using existing target rows for lookups");
    }

    let mut tables = Vec::with_capacity(plan.tables().len());
    for table in plan.tables() {
        println!("\n{}", format!("🔄 MIGRATING {} → {}", table.legacy_name(), table.target_name()).bold().blue());
        let report = match table {
            Table::Divisions => migrate_table::<LegacyDivision>(conns, &legacy_tables, options).await?,
            Table::Departments => migrate_table::<LegacyDepartment>(conns, &legacy_tables, options).await?,
            Table::Sections => migrate_table::<LegacySection>(conns, &legacy_tables, options).await?,
            Table::ShiftTypes => migrate_table::<LegacyShiftType>(conns, &legacy_tables, options).await?,
            Table::ShiftGroups => migrate_table::<LegacyShiftGroup>(conns, &legacy_tables, options).await?,
            Table::Employees => migrate_table::<LegacyEmployee>(conns, &legacy_tables, options).await?,
            Table::Attendances => migrate_table::<LegacyAttendance>(conns, &legacy_tables, options).await?,
            Table::Payrolls => migrate_table::<LegacyPayroll>(conns, &legacy_tables, options).await?,
            Table::LeaveRequests => migrate_table::<LegacyLeaveRequest>(conns, &legacy_tables, options).await?,
        };
        tables.push(report);
    }

    Ok(MigrationReport {
        dry_run: options.dry_run,
        tables,
        elapsed_secs: overall_start.elapsed().as_secs_f64(),
    })
}

async fn migrate_table<L>(
    conns: &mut Connections,
    legacy_tables: &HashSet<String>,
    options: &MigrateOptions,
) -> Result<TableReport>
where
    L: LegacyQuery + Transform,
    L::Target: Upsert,
{
    let table = L::TABLE;
    if !legacy_tables.contains(table.legacy_name()) {
        warn!(table = %table, legacy = table.legacy_name(), "legacy table not found, skipping");
        return Ok(TableReport::source_missing(table));
    }

    if options.dry_run {
        return migrate_rows::<L>(conns, options).await;
    }

    let run_id = postgres::start_run(&conns.postgres, table).await?;
    match migrate_rows::<L>(conns, options).await {
        Ok(report) => {
            postgres::finish_run(&conns.postgres, run_id, report.counts()).await?;
            Ok(report)
        }
        Err(err) => {
            if let Err(ledger_err) = postgres::fail_run(&conns.postgres, run_id, &format!("{:#}", err)).await {
                warn!(table = %table, error = %ledger_err, "could not mark run as failed");
            }
            Err(err)
        }
    }
}

async fn migrate_rows<L>(conns: &mut Connections, options: &MigrateOptions) -> Result<TableReport>
where
    L: LegacyQuery + Transform,
    L::Target: Upsert,
{
    let table = L::TABLE;
    let start = Instant::now();
    info!(table = %table, dry_run = options.dry_run, "migrating table");

    let multi_progress = create_multi_progress();
    let fetch_spinner = multi_progress.add(create_spinner(&format!(
        "📥 Fetching {} and {} lookups...",
        table.legacy_name(),
        table.dependencies().len()
    )));

    // Both sides at once: legacy rows from MySQL, parent ids from PostgreSQL.
    let (legacy, mut lookups) = try_join(
        mysql::fetch_legacy::<L>(&mut conns.mysql),
        postgres::load_lookups(&conns.postgres, table.dependencies()),
    )
    .await?;

    fetch_spinner.finish_with_message(format!(
        "✅ Fetched {} legacy {} rows in {:.2}s",
        legacy.len().to_string().green().bold(),
        table.legacy_name(),
        start.elapsed().as_secs_f64().to_string().yellow()
    ));

    let transformed = transform_all(&legacy, &mut lookups);
    for (key, err) in &transformed.failed {
        warn!(table = %table, key = %key, error = %err, "row failed to transform");
    }
    for (key, err) in &transformed.skipped {
        debug!(table = %table, key = %key, error = %err, "row skipped");
    }

    let written = if options.dry_run {
        None
    } else {
        let progress_bar = multi_progress.add(create_progress_bar(
            transformed.rows.len() as u64,
            &format!("🔄 {} → {}", table.legacy_name().green(), table.target_name().blue()),
        ));
        let outcome = upsert_rows(&mut conns.postgres, &transformed.rows, options.batch_size, &progress_bar).await?;
        progress_bar.finish_with_message(format!(
            "✅ {} | {} inserted, {} updated, {} rejected",
            table.target_name(),
            outcome.inserted.to_string().green(),
            outcome.updated.to_string().green(),
            outcome.failed.len().to_string().red()
        ));
        Some(outcome)
    };

    let report = build_report(
        table,
        legacy.len(),
        &transformed,
        written.as_ref(),
        &lookups,
        options.sample,
        start.elapsed().as_secs_f64(),
    );
    info!(
        table = %table,
        read = report.read,
        inserted = report.inserted,
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failed,
        "table finished"
    );
    Ok(report)
}

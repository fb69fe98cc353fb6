use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tokio_postgres::Client;

use crate::migrate::lookup::{CodeLookup, Lookups};
use crate::migrate::plan::Table;

/// Natural key column a lookup is keyed by, for the tables other rows point at.
fn lookup_query(table: Table) -> Option<&'static str> {
    match table {
        Table::Divisions => Some("SELECT code, id FROM divisions"),
        Table::Departments => Some("SELECT code, id FROM departments"),
        Table::Sections => Some("SELECT code, id FROM sections"),
        Table::ShiftTypes => Some("SELECT code, id FROM shift_types"),
        Table::ShiftGroups => Some("SELECT code, id FROM shift_groups"),
        Table::Employees => Some("SELECT empl_id, id FROM employees"),
        Table::Attendances | Table::Payrolls | Table::LeaveRequests => None,
    }
}

/// Keys spelled exactly like `LegacyRecord::key` spells them.
fn keys_query(table: Table) -> &'static str {
    match table {
        Table::Divisions => "SELECT code FROM divisions",
        Table::Departments => "SELECT code FROM departments",
        Table::Sections => "SELECT code FROM sections",
        Table::ShiftTypes => "SELECT code FROM shift_types",
        Table::ShiftGroups => "SELECT code FROM shift_groups",
        Table::Employees => "SELECT empl_id FROM employees",
        Table::Attendances => {
            "SELECT e.empl_id || '|' || to_char(a.work_date, 'YYYY-MM-DD') \
             FROM attendances a JOIN employees e ON e.id = a.employee_id"
        }
        Table::Payrolls => {
            "SELECT e.empl_id || '|' || p.period \
             FROM payrolls p JOIN employees e ON e.id = p.employee_id"
        }
        Table::LeaveRequests => "SELECT request_no FROM leave_requests",
    }
}

pub async fn table_exists(client: &Client, table: Table) -> Result<bool> {
    let row = client
        .query_one(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1)",
            &[&table.target_name()],
        )
        .await?;
    Ok(row.get(0))
}

/// A table that does not exist yet yields an empty lookup.
pub async fn load_lookup(client: &Client, table: Table) -> Result<CodeLookup> {
    let Some(query) = lookup_query(table) else {
        return Ok(CodeLookup::new(table));
    };
    if !table_exists(client, table).await? {
        return Ok(CodeLookup::new(table));
    }
    let rows = client
        .query(query, &[])
        .await
        .with_context(|| format!("Failed to load {} lookup", table))?;
    Ok(CodeLookup::from_pairs(
        table,
        rows.iter().map(|row| (row.get::<_, String>(0), row.get::<_, i32>(1))),
    ))
}

pub async fn load_lookups(client: &Client, tables: &[Table]) -> Result<Lookups> {
    let mut lookups = Lookups::new();
    for table in tables {
        lookups.insert(load_lookup(client, *table).await?);
    }
    Ok(lookups)
}

pub async fn count(client: &Client, table: Table) -> Result<i64> {
    if !table_exists(client, table).await? {
        return Ok(0);
    }
    let query = format!("SELECT COUNT(*) FROM {}", table.target_name());
    let row = client.query_one(query.as_str(), &[]).await?;
    Ok(row.get(0))
}

pub async fn existing_keys(client: &Client, table: Table) -> Result<HashSet<String>> {
    if !table_exists(client, table).await? {
        return Ok(HashSet::new());
    }
    let rows = client
        .query(keys_query(table), &[])
        .await
        .with_context(|| format!("Failed to read {} keys", table))?;
    Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
}

// Ledger of table migrations.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub read: i32,
    pub inserted: i32,
    pub updated: i32,
    pub skipped: i32,
    pub failed: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub table_name: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub read: i32,
    pub inserted: i32,
    pub updated: i32,
    pub skipped: i32,
    pub failed: i32,
}

pub async fn start_run(client: &Client, table: Table) -> Result<i64> {
    let row = client
        .query_one(
            "INSERT INTO migration_runs (table_name, status) VALUES ($1, 'RUNNING') RETURNING id",
            &[&table.target_name()],
        )
        .await
        .context("Failed to record migration run")?;
    Ok(row.get(0))
}

pub async fn finish_run(client: &Client, run_id: i64, counts: RunCounts) -> Result<()> {
    client
        .execute(
            "UPDATE migration_runs SET status = 'COMPLETED', finished_at = now(), \
             read_count = $2, inserted_count = $3, updated_count = $4, \
             skipped_count = $5, failed_count = $6 WHERE id = $1",
            &[
                &run_id,
                &counts.read,
                &counts.inserted,
                &counts.updated,
                &counts.skipped,
                &counts.failed,
            ],
        )
        .await
        .context("Failed to finish migration run")?;
    Ok(())
}

pub async fn fail_run(client: &Client, run_id: i64, error: &str) -> Result<()> {
    client
        .execute(
            "UPDATE migration_runs SET status = 'FAILED', finished_at = now(), error = $2 WHERE id = $1",
            &[&run_id, &error],
        )
        .await?;
    Ok(())
}

/// The most recent run per table.
pub async fn latest_runs(client: &Client) -> Result<Vec<RunRecord>> {
    let rows = client
        .query(
            "SELECT DISTINCT ON (table_name) table_name, status, started_at, finished_at, \
             read_count, inserted_count, updated_count, skipped_count, failed_count \
             FROM migration_runs ORDER BY table_name, started_at DESC",
            &[],
        )
        .await
        .context("Failed to read migration runs, has `prepare` been run?")?;

    Ok(rows
        .iter()
        .map(|row| RunRecord {
            table_name: row.get(0),
            status: row.get(1),
            started_at: row.get(2),
            finished_at: row.get(3),
            read: row.get(4),
            inserted: row.get(5),
            updated: row.get(6),
            skipped: row.get(7),
            failed: row.get(8),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_exist_for_every_dependency() {
        for table in Table::ALL {
            for dep in table.dependencies() {
                assert!(lookup_query(*dep).is_some(), "{} has no lookup", dep);
            }
        }
    }

    #[test]
    fn key_queries_read_their_own_table() {
        for table in Table::ALL {
            assert!(keys_query(table).contains(table.target_name()));
        }
    }
}

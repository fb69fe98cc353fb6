// Compares the legacy HRIS with the migrated target, table by table.

use anyhow::Result;
use futures_util::future::try_join;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::info;

use crate::database::connection::Connections;
use crate::database::mysql::{self, LegacyQuery};
use crate::database::postgres;
use crate::migrate::engine::transform_all;
use crate::migrate::lookup::UnresolvedSummary;
use crate::migrate::plan::{Plan, Table};
use crate::migrate::transform::Transform;
use crate::models::*;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyDiff {
    pub legacy_rows: usize,
    pub target_rows: usize,
    pub missing_in_target: usize,
    pub missing_sample: Vec<String>,
    pub extra_in_target: usize,
    pub duplicate_legacy_keys: usize,
}

/// Set difference over normalised natural keys.
pub fn compare_keys(legacy: &[String], target: &HashSet<String>, sample: usize) -> KeyDiff {
    let distinct: BTreeSet<&str> = legacy.iter().map(String::as_str).collect();
    let missing: Vec<&str> = distinct
        .iter()
        .copied()
        .filter(|key| !target.contains(*key))
        .collect();
    let extra = target
        .iter()
        .filter(|key| !distinct.contains(key.as_str()))
        .count();

    KeyDiff {
        legacy_rows: legacy.len(),
        target_rows: target.len(),
        missing_in_target: missing.len(),
        missing_sample: missing.iter().take(sample).map(|k| k.to_string()).collect(),
        extra_in_target: extra,
        duplicate_legacy_keys: legacy.len() - distinct.len(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableReconciliation {
    pub table: Table,
    pub source_missing: bool,
    pub keys: KeyDiff,
    /// Rows a migration would skip right now (owner not in the target).
    pub would_skip: usize,
    /// Rows a migration would reject right now (bad codes, dates, amounts).
    pub would_fail: usize,
    pub unresolved: Vec<UnresolvedSummary>,
}

impl TableReconciliation {
    /// Optional references that resolve to nothing in the target.
    pub fn orphan_references(&self) -> usize {
        self.unresolved.iter().map(|u| u.occurrences).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub tables: Vec<TableReconciliation>,
}

impl ReconcileReport {
    pub fn is_consistent(&self) -> bool {
        self.tables.iter().all(|t| t.keys.missing_in_target == 0)
    }
}

pub async fn reconcile(conns: &mut Connections, plan: &Plan, sample: usize) -> Result<ReconcileReport> {
    let legacy_tables = mysql::existing_tables(&mut conns.mysql).await?;

    let mut tables = Vec::with_capacity(plan.tables().len());
    for table in plan.tables() {
        let result = match table {
            Table::Divisions => reconcile_table::<LegacyDivision>(conns, &legacy_tables, sample).await?,
            Table::Departments => reconcile_table::<LegacyDepartment>(conns, &legacy_tables, sample).await?,
            Table::Sections => reconcile_table::<LegacySection>(conns, &legacy_tables, sample).await?,
            Table::ShiftTypes => reconcile_table::<LegacyShiftType>(conns, &legacy_tables, sample).await?,
            Table::ShiftGroups => reconcile_table::<LegacyShiftGroup>(conns, &legacy_tables, sample).await?,
            Table::Employees => reconcile_table::<LegacyEmployee>(conns, &legacy_tables, sample).await?,
            Table::Attendances => reconcile_table::<LegacyAttendance>(conns, &legacy_tables, sample).await?,
            Table::Payrolls => reconcile_table::<LegacyPayroll>(conns, &legacy_tables, sample).await?,
            Table::LeaveRequests => reconcile_table::<LegacyLeaveRequest>(conns, &legacy_tables, sample).await?,
        };
        tables.push(result);
    }

    Ok(ReconcileReport { tables })
}

async fn reconcile_table<L>(
    conns: &mut Connections,
    legacy_tables: &HashSet<String>,
    sample: usize,
) -> Result<TableReconciliation>
where
    L: LegacyQuery + Transform,
{
    let table = L::TABLE;
    let target_keys = postgres::existing_keys(&conns.postgres, table).await?;

    if !legacy_tables.contains(table.legacy_name()) {
        return Ok(TableReconciliation {
            table,
            source_missing: true,
            keys: compare_keys(&[], &target_keys, sample),
            would_skip: 0,
            would_fail: 0,
            unresolved: Vec::new(),
        });
    }

    let (legacy, mut lookups) = try_join(
        mysql::fetch_legacy::<L>(&mut conns.mysql),
        postgres::load_lookups(&conns.postgres, table.dependencies()),
    )
    .await?;

    let legacy_keys: Vec<String> = legacy.iter().map(|row| row.key()).collect();
    let keys = compare_keys(&legacy_keys, &target_keys, sample);

    // Replay the backfill against today's target to surface orphaned codes.
    let replay = transform_all(&legacy, &mut lookups);

    info!(
        table = %table,
        legacy = keys.legacy_rows,
        target = keys.target_rows,
        missing = keys.missing_in_target,
        "table reconciled"
    );

    Ok(TableReconciliation {
        table,
        source_missing: false,
        keys,
        would_skip: replay.skipped.len(),
        would_fail: replay.failed.len(),
        unresolved: lookups.unresolved_summary(sample),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn set(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn missing_keys_are_legacy_minus_target() {
        let diff = compare_keys(
            &keys(&["K003", "K001", "K002", "K001"]),
            &set(&["K001", "K009"]),
            10,
        );
        assert_eq!(diff.legacy_rows, 4);
        assert_eq!(diff.target_rows, 2);
        assert_eq!(diff.missing_in_target, 2);
        assert_eq!(diff.missing_sample, keys(&["K002", "K003"]));
        assert_eq!(diff.extra_in_target, 1);
        assert_eq!(diff.duplicate_legacy_keys, 1);
    }

    #[test]
    fn sample_limits_listed_keys_only() {
        let legacy: Vec<String> = (0..50).map(|i| format!("K{:03}", i)).collect();
        let diff = compare_keys(&legacy, &HashSet::new(), 5);
        assert_eq!(diff.missing_in_target, 50);
        assert_eq!(diff.missing_sample.len(), 5);
        assert_eq!(diff.missing_sample[0], "K000");
    }

    #[test]
    fn consistency_ignores_extra_target_rows() {
        let table = |missing: &[&str], target: &[&str]| TableReconciliation {
            table: Table::Employees,
            source_missing: false,
            keys: compare_keys(&keys(missing), &set(target), 10),
            would_skip: 0,
            would_fail: 0,
            unresolved: vec![UnresolvedSummary {
                table: Table::Sections,
                distinct_codes: 1,
                occurrences: 4,
                sample: keys(&["S9"]),
            }],
        };

        let agreeing = ReconcileReport {
            tables: vec![table(&["K1"], &["K1", "K2"])],
        };
        assert!(agreeing.is_consistent());
        assert_eq!(agreeing.tables[0].orphan_references(), 4);

        let lagging = ReconcileReport {
            tables: vec![table(&["K1", "K3"], &["K1"])],
        };
        assert!(!lagging.is_consistent());
    }
}

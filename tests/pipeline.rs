use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;

use hris_migrate::migrate::engine::{build_report, transform_all, TableOutcome};
use hris_migrate::migrate::lookup::{CodeLookup, Lookups};
use hris_migrate::migrate::plan::{Plan, Table};
use hris_migrate::migrate::transform::LegacyRecord;
use hris_migrate::models::*;
use hris_migrate::reconcile::compare_keys;

fn employee(nik: &str, status: Option<&str>, kd_sie: Option<&str>) -> LegacyEmployee {
    LegacyEmployee {
        nik: nik.to_string(),
        nama: Some(format!("  Karyawan {}  ", nik)),
        jen_kel: Some("L".to_string()),
        tgl_masuk: Some("2019-03-01".to_string()),
        tgl_keluar: Some("0000-00-00".to_string()),
        status_karyawan: status.map(str::to_string),
        kd_bag: Some("prd".to_string()),
        kd_sie: kd_sie.map(str::to_string),
        ..Default::default()
    }
}

fn datetime(date: &str, time: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M:%S").unwrap()
}

#[test]
fn selection_is_migrated_parents_first() {
    let plan = Plan::from_selection(&[Table::Payrolls, Table::Employees, Table::Divisions]);
    assert_eq!(plan.tables(), &[Table::Divisions, Table::Employees, Table::Payrolls]);
    for (i, table) in plan.tables().iter().enumerate() {
        for dep in table.dependencies() {
            if let Some(j) = plan.tables().iter().position(|t| t == dep) {
                assert!(j < i, "{} must run before {}", dep, table);
            }
        }
    }
}

#[test]
fn employees_backfill_parents_and_isolate_bad_rows() {
    let legacy = vec![
        employee("K001", Some("tetap"), Some("SIE1")),
        employee("K002", Some("KONTRAK"), Some("SIE9")),
        employee("K003", None, None),
    ];
    let mut lookups = Lookups::new()
        .with(CodeLookup::from_pairs(Table::Divisions, [("PRD", 7)]))
        .with(CodeLookup::from_pairs(Table::Sections, [("SIE1", 11)]));

    let transformed = transform_all(&legacy, &mut lookups);
    assert_eq!(transformed.rows.len(), 2);
    assert_eq!(transformed.failed.len(), 1);
    assert_eq!(transformed.failed[0].0, "K003");
    assert!(transformed.skipped.is_empty());

    let first = &transformed.rows[0].1;
    assert_eq!(first.name, "Karyawan K001");
    assert_eq!(first.employment_status, EmploymentStatus::Permanent);
    assert_eq!(first.gender, Some(Gender::Male));
    assert_eq!(first.division_id, Some(7));
    assert_eq!(first.section_id, Some(11));
    assert_eq!(first.resign_date, None);
    assert!(first.is_active);

    // Unknown optional parent: row kept, FK left empty, code reported.
    assert_eq!(transformed.rows[1].1.section_id, None);

    let report = build_report(Table::Employees, legacy.len(), &transformed, None, &lookups, 10, 0.0);
    assert_eq!(report.outcome, TableOutcome::DryRun);
    assert!(report.is_balanced());
    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].table, Table::Sections);
    assert_eq!(report.unresolved[0].sample, vec!["SIE9".to_string()]);
}

#[test]
fn attendance_needs_its_employee_and_rolls_night_shifts() {
    let legacy = vec![
        LegacyAttendance {
            nik: "K001".to_string(),
            tanggal: "2024-01-15".to_string(),
            jam_masuk: Some("22:00:00".to_string()),
            jam_keluar: Some("06:00:00".to_string()),
            kd_jam: Some("MALAM".to_string()),
            status: Some("H".to_string()),
            ..Default::default()
        },
        LegacyAttendance {
            nik: "K777".to_string(),
            tanggal: "2024-01-15".to_string(),
            status: Some("H".to_string()),
            ..Default::default()
        },
    ];
    let mut lookups = Lookups::new()
        .with(CodeLookup::from_pairs(Table::Employees, [("K001", 1)]))
        .with(CodeLookup::from_pairs(Table::ShiftTypes, [("MALAM", 3)]));

    let transformed = transform_all(&legacy, &mut lookups);
    assert_eq!(transformed.rows.len(), 1);
    assert_eq!(transformed.skipped.len(), 1);
    assert!(transformed.failed.is_empty());

    let row = &transformed.rows[0].1;
    assert_eq!(row.work_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    assert_eq!(row.check_in, Some(datetime("2024-01-15", "22:00:00")));
    assert_eq!(row.check_out, Some(datetime("2024-01-16", "06:00:00")));
    assert_eq!(row.shift_type_id, Some(3));
    assert_eq!(row.status, AttendanceStatus::Present);

    let report = build_report(Table::Attendances, legacy.len(), &transformed, None, &lookups, 10, 0.0);
    assert_eq!(report.skipped, 1);
    assert!(report.is_balanced());
}

#[test]
fn reconciliation_finds_rows_the_migration_dropped() {
    let legacy = vec![
        employee("K001", Some("T"), None),
        employee("K002", Some("T"), None),
        employee("K003", None, None),
    ];
    let mut lookups = Lookups::new();
    let transformed = transform_all(&legacy, &mut lookups);

    let target: HashSet<String> = transformed.rows.iter().map(|(_, e)| e.empl_id.clone()).collect();
    let legacy_keys: Vec<String> = legacy.iter().map(|e| e.key()).collect();
    let diff = compare_keys(&legacy_keys, &target, 10);

    assert_eq!(diff.legacy_rows, 3);
    assert_eq!(diff.target_rows, 2);
    assert_eq!(diff.missing_in_target, transformed.failed.len());
    assert_eq!(diff.missing_sample, vec!["K003".to_string()]);
    assert_eq!(diff.extra_in_target, 0);
}

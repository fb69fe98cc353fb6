use anyhow::{Context, Result};
use colored::*;
use indicatif::ProgressBar;
use std::time::Instant;
use tokio_postgres::types::ToSql;
use tokio_postgres::Client;
use tracing::warn;

use crate::error::RowError;
use crate::migrate::plan::Table;
use crate::models::*;
use crate::ui::format_transfer_speed;

pub type SqlParam = Box<dyn ToSql + Sync + Send>;

/// A target row that knows how to write itself idempotently.
pub trait Upsert {
    const TABLE: Table;

    /// `INSERT ... ON CONFLICT (<natural key>) DO UPDATE ... RETURNING (xmax = 0)`.
    const SQL: &'static str;

    fn params(&self) -> Vec<SqlParam>;
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub inserted: u32,
    pub updated: u32,
    pub failed: Vec<(String, RowError)>,
}

fn as_params(values: &[SqlParam]) -> Vec<&(dyn ToSql + Sync)> {
    values
        .iter()
        .map(|v| v.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

fn text<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// Writes rows in chunks, one transaction per chunk and one savepoint per row,
/// so a rejected row never takes its neighbours down with it. Each row travels
/// with its legacy key, which is what failures are reported under.
pub async fn upsert_rows<T: Upsert>(
    client: &mut Client,
    rows: &[(String, T)],
    batch_size: usize,
    progress_bar: &ProgressBar,
) -> Result<UpsertOutcome> {
    let mut outcome = UpsertOutcome::default();
    if rows.is_empty() {
        return Ok(outcome);
    }

    let start_time = Instant::now();
    let batch_size = batch_size.max(1);
    let total_batches = rows.len().div_ceil(batch_size);
    let table = T::TABLE.target_name();

    for (chunk_idx, chunk) in rows.chunks(batch_size).enumerate() {
        let batch_start = Instant::now();
        let mut transaction = client
            .transaction()
            .await
            .with_context(|| format!("Failed to open transaction for {}", table))?;
        let statement = transaction
            .prepare(T::SQL)
            .await
            .with_context(|| format!("Failed to prepare upsert for {}", table))?;

        for (key, row) in chunk {
            let params = row.params();
            let savepoint = transaction.transaction().await?;
            match savepoint.query_one(&statement, &as_params(&params)).await {
                Ok(result) => {
                    savepoint.commit().await?;
                    let inserted: bool = result.get(0);
                    if inserted {
                        outcome.inserted += 1;
                    } else {
                        outcome.updated += 1;
                    }
                }
                Err(err) => {
                    savepoint.rollback().await?;
                    let err = RowError::from(err);
                    warn!(table, key = %key, error = %err, "row rejected by target");
                    outcome.failed.push((key.clone(), err));
                }
            }
            progress_bar.inc(1);
        }

        transaction
            .commit()
            .await
            .with_context(|| format!("Failed to commit {} batch {}", table, chunk_idx + 1))?;

        let written = outcome.inserted + outcome.updated;
        let batch_speed = format_transfer_speed(chunk.len() as u32, batch_start.elapsed().as_secs_f64());
        let overall_speed = format_transfer_speed(written, start_time.elapsed().as_secs_f64());
        progress_bar.set_message(format!(
            "🔄 {} → {} | Batch {}/{} | {} | {} | Last batch: {}",
            T::TABLE.legacy_name().green(),
            table.blue(),
            chunk_idx + 1,
            total_batches,
            format!("{}/{} records", written, rows.len()).yellow(),
            overall_speed.bright_blue(),
            batch_speed.cyan()
        ));
    }

    Ok(outcome)
}

impl Upsert for Division {
    const TABLE: Table = Table::Divisions;
    const SQL: &'static str = "INSERT INTO divisions (code, name) VALUES ($1, $2) \
         ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name, updated_at = now() \
         RETURNING (xmax = 0) AS inserted";

    fn params(&self) -> Vec<SqlParam> {
        vec![Box::new(self.code.clone()), Box::new(self.name.clone())]
    }
}

impl Upsert for Department {
    const TABLE: Table = Table::Departments;
    const SQL: &'static str = "INSERT INTO departments (code, name, division_id) VALUES ($1, $2, $3) \
         ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name, division_id = EXCLUDED.division_id, \
         updated_at = now() \
         RETURNING (xmax = 0) AS inserted";

    fn params(&self) -> Vec<SqlParam> {
        vec![
            Box::new(self.code.clone()),
            Box::new(self.name.clone()),
            Box::new(self.division_id),
        ]
    }
}

impl Upsert for Section {
    const TABLE: Table = Table::Sections;
    const SQL: &'static str = "INSERT INTO sections (code, name, department_id) VALUES ($1, $2, $3) \
         ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name, department_id = EXCLUDED.department_id, \
         updated_at = now() \
         RETURNING (xmax = 0) AS inserted";

    fn params(&self) -> Vec<SqlParam> {
        vec![
            Box::new(self.code.clone()),
            Box::new(self.name.clone()),
            Box::new(self.department_id),
        ]
    }
}

impl Upsert for ShiftType {
    const TABLE: Table = Table::ShiftTypes;
    const SQL: &'static str = "INSERT INTO shift_types (code, name, start_time, end_time, crosses_midnight) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name, start_time = EXCLUDED.start_time, \
         end_time = EXCLUDED.end_time, crosses_midnight = EXCLUDED.crosses_midnight, updated_at = now() \
         RETURNING (xmax = 0) AS inserted";

    fn params(&self) -> Vec<SqlParam> {
        vec![
            Box::new(self.code.clone()),
            Box::new(self.name.clone()),
            Box::new(self.start_time),
            Box::new(self.end_time),
            Box::new(self.crosses_midnight),
        ]
    }
}

impl Upsert for ShiftGroup {
    const TABLE: Table = Table::ShiftGroups;
    const SQL: &'static str = "INSERT INTO shift_groups (code, name, shift_type_id) VALUES ($1, $2, $3) \
         ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name, shift_type_id = EXCLUDED.shift_type_id, \
         updated_at = now() \
         RETURNING (xmax = 0) AS inserted";

    fn params(&self) -> Vec<SqlParam> {
        vec![
            Box::new(self.code.clone()),
            Box::new(self.name.clone()),
            Box::new(self.shift_type_id),
        ]
    }
}

impl Upsert for Employee {
    const TABLE: Table = Table::Employees;
    const SQL: &'static str = "INSERT INTO employees (empl_id, name, gender, birth_date, religion, \
         marital_status, hire_date, resign_date, employment_status, is_active, division_id, \
         department_id, section_id, shift_group_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         ON CONFLICT (empl_id) DO UPDATE SET name = EXCLUDED.name, gender = EXCLUDED.gender, \
         birth_date = EXCLUDED.birth_date, religion = EXCLUDED.religion, \
         marital_status = EXCLUDED.marital_status, hire_date = EXCLUDED.hire_date, \
         resign_date = EXCLUDED.resign_date, employment_status = EXCLUDED.employment_status, \
         is_active = EXCLUDED.is_active, division_id = EXCLUDED.division_id, \
         department_id = EXCLUDED.department_id, section_id = EXCLUDED.section_id, \
         shift_group_id = EXCLUDED.shift_group_id, updated_at = now() \
         RETURNING (xmax = 0) AS inserted";

    fn params(&self) -> Vec<SqlParam> {
        vec![
            Box::new(self.empl_id.clone()),
            Box::new(self.name.clone()),
            Box::new(text(self.gender)),
            Box::new(self.birth_date),
            Box::new(text(self.religion)),
            Box::new(text(self.marital_status)),
            Box::new(self.hire_date),
            Box::new(self.resign_date),
            Box::new(self.employment_status.to_string()),
            Box::new(self.is_active),
            Box::new(self.division_id),
            Box::new(self.department_id),
            Box::new(self.section_id),
            Box::new(self.shift_group_id),
        ]
    }
}

impl Upsert for Attendance {
    const TABLE: Table = Table::Attendances;
    const SQL: &'static str = "INSERT INTO attendances (employee_id, work_date, check_in, check_out, \
         shift_type_id, status, remarks) VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (employee_id, work_date) DO UPDATE SET check_in = EXCLUDED.check_in, \
         check_out = EXCLUDED.check_out, shift_type_id = EXCLUDED.shift_type_id, \
         status = EXCLUDED.status, remarks = EXCLUDED.remarks, updated_at = now() \
         RETURNING (xmax = 0) AS inserted";

    fn params(&self) -> Vec<SqlParam> {
        vec![
            Box::new(self.employee_id),
            Box::new(self.work_date),
            Box::new(self.check_in),
            Box::new(self.check_out),
            Box::new(self.shift_type_id),
            Box::new(self.status.to_string()),
            Box::new(self.remarks.clone()),
        ]
    }
}

impl Upsert for Payroll {
    const TABLE: Table = Table::Payrolls;
    const SQL: &'static str = "INSERT INTO payrolls (employee_id, period, base_salary, allowance, \
         overtime, deduction, net_pay) VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (employee_id, period) DO UPDATE SET base_salary = EXCLUDED.base_salary, \
         allowance = EXCLUDED.allowance, overtime = EXCLUDED.overtime, \
         deduction = EXCLUDED.deduction, net_pay = EXCLUDED.net_pay, updated_at = now() \
         RETURNING (xmax = 0) AS inserted";

    fn params(&self) -> Vec<SqlParam> {
        vec![
            Box::new(self.employee_id),
            Box::new(self.period.clone()),
            Box::new(self.base_salary),
            Box::new(self.allowance),
            Box::new(self.overtime),
            Box::new(self.deduction),
            Box::new(self.net_pay),
        ]
    }
}

impl Upsert for LeaveRequest {
    const TABLE: Table = Table::LeaveRequests;
    const SQL: &'static str = "INSERT INTO leave_requests (request_no, employee_id, kind, start_date, \
         end_date, days, reason, status, approver_id, submitted_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (request_no) DO UPDATE SET employee_id = EXCLUDED.employee_id, \
         kind = EXCLUDED.kind, start_date = EXCLUDED.start_date, end_date = EXCLUDED.end_date, \
         days = EXCLUDED.days, reason = EXCLUDED.reason, status = EXCLUDED.status, \
         approver_id = EXCLUDED.approver_id, submitted_at = EXCLUDED.submitted_at, updated_at = now() \
         RETURNING (xmax = 0) AS inserted";

    fn params(&self) -> Vec<SqlParam> {
        vec![
            Box::new(self.request_no.clone()),
            Box::new(self.employee_id),
            Box::new(self.kind.to_string()),
            Box::new(self.start_date),
            Box::new(self.end_date),
            Box::new(self.days),
            Box::new(self.reason.clone()),
            Box::new(self.status.to_string()),
            Box::new(self.approver_id),
            Box::new(self.submitted_at),
        ]
    }
}

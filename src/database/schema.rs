use anyhow::{Context, Result};
use tokio_postgres::Client;

use crate::database::mysql::existing_tables;
use crate::migrate::plan::Table;

/// Target tables, in dependency order. Enum columns are TEXT checked against
/// the variant names the application writes.
pub const TARGET_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS divisions (
    id          SERIAL PRIMARY KEY,
    code        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS departments (
    id           SERIAL PRIMARY KEY,
    code         TEXT NOT NULL UNIQUE,
    name         TEXT NOT NULL,
    division_id  INTEGER REFERENCES divisions(id) ON DELETE SET NULL,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at   TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS sections (
    id             SERIAL PRIMARY KEY,
    code           TEXT NOT NULL UNIQUE,
    name           TEXT NOT NULL,
    department_id  INTEGER REFERENCES departments(id) ON DELETE SET NULL,
    created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at     TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS shift_types (
    id                SERIAL PRIMARY KEY,
    code              TEXT NOT NULL UNIQUE,
    name              TEXT NOT NULL,
    start_time        TIME,
    end_time          TIME,
    crosses_midnight  BOOLEAN NOT NULL DEFAULT FALSE,
    created_at        TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at        TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS shift_groups (
    id             SERIAL PRIMARY KEY,
    code           TEXT NOT NULL UNIQUE,
    name           TEXT NOT NULL,
    shift_type_id  INTEGER REFERENCES shift_types(id) ON DELETE SET NULL,
    created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at     TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS employees (
    id                 SERIAL PRIMARY KEY,
    empl_id            TEXT NOT NULL UNIQUE,
    name               TEXT NOT NULL,
    gender             TEXT CHECK (gender IN ('MALE', 'FEMALE')),
    birth_date         DATE,
    religion           TEXT CHECK (religion IN ('ISLAM', 'PROTESTANT', 'CATHOLIC', 'HINDU', 'BUDDHIST', 'CONFUCIAN')),
    marital_status     TEXT CHECK (marital_status IN ('SINGLE', 'MARRIED', 'DIVORCED')),
    hire_date          DATE,
    resign_date        DATE,
    employment_status  TEXT NOT NULL CHECK (employment_status IN ('PERMANENT', 'CONTRACT', 'DAILY', 'PROBATION')),
    is_active          BOOLEAN NOT NULL DEFAULT TRUE,
    division_id        INTEGER REFERENCES divisions(id) ON DELETE SET NULL,
    department_id      INTEGER REFERENCES departments(id) ON DELETE SET NULL,
    section_id         INTEGER REFERENCES sections(id) ON DELETE SET NULL,
    shift_group_id     INTEGER REFERENCES shift_groups(id) ON DELETE SET NULL,
    created_at         TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at         TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS attendances (
    id             SERIAL PRIMARY KEY,
    employee_id    INTEGER NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    work_date      DATE NOT NULL,
    check_in       TIMESTAMP,
    check_out      TIMESTAMP,
    shift_type_id  INTEGER REFERENCES shift_types(id) ON DELETE SET NULL,
    status         TEXT NOT NULL CHECK (status IN ('PRESENT', 'LATE', 'SICK', 'PERMISSION', 'ABSENT', 'LEAVE', 'HOLIDAY', 'BUSINESS_TRIP')),
    remarks        TEXT,
    created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (employee_id, work_date)
);

CREATE TABLE IF NOT EXISTS payrolls (
    id           SERIAL PRIMARY KEY,
    employee_id  INTEGER NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    period       CHAR(7) NOT NULL,
    base_salary  BIGINT NOT NULL DEFAULT 0,
    allowance    BIGINT NOT NULL DEFAULT 0,
    overtime     BIGINT NOT NULL DEFAULT 0,
    deduction    BIGINT NOT NULL DEFAULT 0,
    net_pay      BIGINT NOT NULL DEFAULT 0,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (employee_id, period)
);

CREATE TABLE IF NOT EXISTS leave_requests (
    id            SERIAL PRIMARY KEY,
    request_no    TEXT NOT NULL UNIQUE,
    employee_id   INTEGER NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    kind          TEXT NOT NULL CHECK (kind IN ('ANNUAL_LEAVE', 'PERMISSION', 'SICK_LEAVE', 'BUSINESS_TRIP')),
    start_date    DATE NOT NULL,
    end_date      DATE NOT NULL,
    days          INTEGER NOT NULL,
    reason        TEXT,
    status        TEXT NOT NULL CHECK (status IN ('PENDING', 'APPROVED', 'REJECTED', 'CANCELLED')),
    approver_id   INTEGER REFERENCES employees(id) ON DELETE SET NULL,
    submitted_at  DATE,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
    CHECK (end_date >= start_date)
);

CREATE TABLE IF NOT EXISTS migration_runs (
    id              BIGSERIAL PRIMARY KEY,
    table_name      TEXT NOT NULL,
    status          TEXT NOT NULL CHECK (status IN ('RUNNING', 'COMPLETED', 'FAILED')),
    started_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    finished_at     TIMESTAMPTZ,
    read_count      INTEGER NOT NULL DEFAULT 0,
    inserted_count  INTEGER NOT NULL DEFAULT 0,
    updated_count   INTEGER NOT NULL DEFAULT 0,
    skipped_count   INTEGER NOT NULL DEFAULT 0,
    failed_count    INTEGER NOT NULL DEFAULT 0,
    error           TEXT
);

CREATE INDEX IF NOT EXISTS idx_employees_department ON employees(department_id);
CREATE INDEX IF NOT EXISTS idx_attendances_work_date ON attendances(work_date);
CREATE INDEX IF NOT EXISTS idx_payrolls_period ON payrolls(period);
CREATE INDEX IF NOT EXISTS idx_leave_requests_employee ON leave_requests(employee_id);
CREATE INDEX IF NOT EXISTS idx_migration_runs_table ON migration_runs(table_name, started_at DESC);
"#;

pub async fn ensure_target_schema(client: &Client) -> Result<()> {
    client
        .batch_execute(TARGET_SCHEMA)
        .await
        .context("Failed to create target schema")?;
    Ok(())
}

/// Legacy tables the plan expects but the MySQL schema does not have.
pub async fn missing_legacy_tables(conn: &mut mysql_async::Conn) -> Result<Vec<Table>> {
    let existing = existing_tables(conn).await?;
    Ok(Table::ALL
        .into_iter()
        .filter(|t| !existing.contains(t.legacy_name()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use strum::IntoEnumIterator;

    fn assert_allowed<E: IntoEnumIterator + ToString>() {
        for variant in E::iter() {
            let literal = format!("'{}'", variant.to_string());
            assert!(TARGET_SCHEMA.contains(&literal), "{} missing from schema", literal);
        }
    }

    #[test]
    fn check_constraints_allow_every_variant() {
        assert_allowed::<Gender>();
        assert_allowed::<Religion>();
        assert_allowed::<MaritalStatus>();
        assert_allowed::<EmploymentStatus>();
        assert_allowed::<AttendanceStatus>();
        assert_allowed::<LeaveKind>();
        assert_allowed::<ApprovalStatus>();
    }

    #[test]
    fn every_target_table_is_created_in_order() {
        let mut last = 0;
        for table in Table::ALL {
            let ddl = format!("CREATE TABLE IF NOT EXISTS {} (", table.target_name());
            let pos = TARGET_SCHEMA.find(&ddl).unwrap_or_else(|| panic!("{} not created", table));
            assert!(pos >= last, "{} created before its dependencies", table);
            last = pos;
        }
        assert!(TARGET_SCHEMA.contains("CREATE TABLE IF NOT EXISTS migration_runs ("));
    }
}

// Legacy row -> target row: enum remapping plus foreign-key backfill.

use chrono::{Duration, NaiveDateTime};

use crate::error::RowError;
use crate::migrate::lookup::Lookups;
use crate::migrate::plan::Table;
use crate::migrate::remap::{self, clean_text, normalize_code, parse_opt_amount, parse_opt_date, parse_opt_time};
use crate::models::*;

/// A legacy row with a stable, normalised natural key.
pub trait LegacyRecord {
    const TABLE: Table;

    /// The key as the target would spell it; reconciliation compares these.
    fn key(&self) -> String;
}

pub trait Transform: LegacyRecord {
    type Target;

    fn transform(&self, lookups: &mut Lookups) -> Result<Self::Target, RowError>;
}

fn code_key(value: &str) -> String {
    normalize_code(value).unwrap_or_default()
}

fn required_key(field: &'static str, value: &str) -> Result<String, RowError> {
    normalize_code(value).ok_or(RowError::MissingValue { field })
}

/// Dated keys use the parsed date when possible so `2024-1-5` style noise lines up.
fn dated_key(nik: &str, date: &str) -> String {
    let date = match remap::parse_legacy_date("Tanggal", date) {
        Ok(Some(d)) => d.format("%Y-%m-%d").to_string(),
        _ => date.trim().to_string(),
    };
    format!("{}|{}", code_key(nik), date)
}

impl LegacyRecord for LegacyDivision {
    const TABLE: Table = Table::Divisions;

    fn key(&self) -> String {
        code_key(&self.kd_bag)
    }
}

impl Transform for LegacyDivision {
    type Target = Division;

    fn transform(&self, _lookups: &mut Lookups) -> Result<Division, RowError> {
        let code = required_key("KdBag", &self.kd_bag)?;
        Ok(Division {
            name: clean_text(self.nm_bag.as_deref()).unwrap_or_else(|| code.clone()),
            code,
        })
    }
}

impl LegacyRecord for LegacyDepartment {
    const TABLE: Table = Table::Departments;

    fn key(&self) -> String {
        code_key(&self.kd_dept)
    }
}

impl Transform for LegacyDepartment {
    type Target = Department;

    fn transform(&self, lookups: &mut Lookups) -> Result<Department, RowError> {
        let code = required_key("KdDept", &self.kd_dept)?;
        Ok(Department {
            name: clean_text(self.nm_dept.as_deref()).unwrap_or_else(|| code.clone()),
            division_id: lookups
                .table(Table::Divisions)
                .resolve_optional(self.kd_bag.as_deref()),
            code,
        })
    }
}

impl LegacyRecord for LegacySection {
    const TABLE: Table = Table::Sections;

    fn key(&self) -> String {
        code_key(&self.kd_sie)
    }
}

impl Transform for LegacySection {
    type Target = Section;

    fn transform(&self, lookups: &mut Lookups) -> Result<Section, RowError> {
        let code = required_key("KdSie", &self.kd_sie)?;
        Ok(Section {
            name: clean_text(self.nm_sie.as_deref()).unwrap_or_else(|| code.clone()),
            department_id: lookups
                .table(Table::Departments)
                .resolve_optional(self.kd_dept.as_deref()),
            code,
        })
    }
}

impl LegacyRecord for LegacyShiftType {
    const TABLE: Table = Table::ShiftTypes;

    fn key(&self) -> String {
        code_key(&self.kd_jam)
    }
}

impl Transform for LegacyShiftType {
    type Target = ShiftType;

    fn transform(&self, _lookups: &mut Lookups) -> Result<ShiftType, RowError> {
        let code = required_key("KdJam", &self.kd_jam)?;
        let start_time = parse_opt_time("JamMasuk", self.jam_masuk.as_deref())?;
        let end_time = parse_opt_time("JamKeluar", self.jam_keluar.as_deref())?;
        let crosses_midnight = matches!((start_time, end_time), (Some(s), Some(e)) if e <= s);
        Ok(ShiftType {
            name: clean_text(self.keterangan.as_deref()).unwrap_or_else(|| code.clone()),
            code,
            start_time,
            end_time,
            crosses_midnight,
        })
    }
}

impl LegacyRecord for LegacyShiftGroup {
    const TABLE: Table = Table::ShiftGroups;

    fn key(&self) -> String {
        code_key(&self.kd_group)
    }
}

impl Transform for LegacyShiftGroup {
    type Target = ShiftGroup;

    fn transform(&self, lookups: &mut Lookups) -> Result<ShiftGroup, RowError> {
        let code = required_key("KdGroup", &self.kd_group)?;
        Ok(ShiftGroup {
            name: clean_text(self.nm_group.as_deref()).unwrap_or_else(|| code.clone()),
            shift_type_id: lookups
                .table(Table::ShiftTypes)
                .resolve_optional(self.kd_jam.as_deref()),
            code,
        })
    }
}

impl LegacyRecord for LegacyEmployee {
    const TABLE: Table = Table::Employees;

    fn key(&self) -> String {
        code_key(&self.nik)
    }
}

impl Transform for LegacyEmployee {
    type Target = Employee;

    fn transform(&self, lookups: &mut Lookups) -> Result<Employee, RowError> {
        let empl_id = required_key("NIK", &self.nik)?;
        let name = clean_text(self.nama.as_deref()).ok_or(RowError::MissingValue { field: "Nama" })?;
        let birth_date = parse_opt_date("TglLahir", self.tgl_lahir.as_deref())?;
        let hire_date = parse_opt_date("TglMasuk", self.tgl_masuk.as_deref())?;
        let resign_date = parse_opt_date("TglKeluar", self.tgl_keluar.as_deref())?;
        if let (Some(hired), Some(resigned)) = (hire_date, resign_date) {
            if resigned < hired {
                return Err(RowError::InvalidDate {
                    field: "TglKeluar",
                    value: resigned.to_string(),
                });
            }
        }
        let employment_status = remap::employment_status(self.status_karyawan.as_deref())?;
        let is_active = remap::active_flag(self.aktif.as_deref(), resign_date)?;

        Ok(Employee {
            empl_id,
            name,
            gender: remap::gender(self.jen_kel.as_deref()),
            birth_date,
            religion: remap::religion(self.agama.as_deref()),
            marital_status: remap::marital_status(self.status_nikah.as_deref()),
            hire_date,
            resign_date,
            employment_status,
            is_active,
            division_id: lookups
                .table(Table::Divisions)
                .resolve_optional(self.kd_bag.as_deref()),
            department_id: lookups
                .table(Table::Departments)
                .resolve_optional(self.kd_dept.as_deref()),
            section_id: lookups
                .table(Table::Sections)
                .resolve_optional(self.kd_sie.as_deref()),
            shift_group_id: lookups
                .table(Table::ShiftGroups)
                .resolve_optional(self.kd_group.as_deref()),
        })
    }
}

impl LegacyRecord for LegacyAttendance {
    const TABLE: Table = Table::Attendances;

    fn key(&self) -> String {
        dated_key(&self.nik, &self.tanggal)
    }
}

impl Transform for LegacyAttendance {
    type Target = Attendance;

    fn transform(&self, lookups: &mut Lookups) -> Result<Attendance, RowError> {
        let employee_id = lookups
            .table(Table::Employees)
            .resolve_required(Some(self.nik.as_str()))?;
        let work_date = remap::parse_legacy_date("Tanggal", &self.tanggal)?
            .ok_or(RowError::MissingValue { field: "Tanggal" })?;
        let status = remap::attendance_status(self.status.as_deref())?;

        let check_in = parse_opt_time("JamMasuk", self.jam_masuk.as_deref())?
            .map(|t| NaiveDateTime::new(work_date, t));
        let mut check_out = parse_opt_time("JamKeluar", self.jam_keluar.as_deref())?
            .map(|t| NaiveDateTime::new(work_date, t));
        // Night shifts clock out on the following day.
        if let (Some(start), Some(end)) = (check_in, check_out) {
            if end < start {
                check_out = Some(end + Duration::days(1));
            }
        }

        Ok(Attendance {
            employee_id,
            work_date,
            check_in,
            check_out,
            shift_type_id: lookups
                .table(Table::ShiftTypes)
                .resolve_optional(self.kd_jam.as_deref()),
            status,
            remarks: clean_text(self.keterangan.as_deref()),
        })
    }
}

impl LegacyRecord for LegacyPayroll {
    const TABLE: Table = Table::Payrolls;

    fn key(&self) -> String {
        let period = remap::parse_period(&self.periode).unwrap_or_else(|_| self.periode.trim().to_string());
        format!("{}|{}", code_key(&self.nik), period)
    }
}

impl Transform for LegacyPayroll {
    type Target = Payroll;

    fn transform(&self, lookups: &mut Lookups) -> Result<Payroll, RowError> {
        let employee_id = lookups
            .table(Table::Employees)
            .resolve_required(Some(self.nik.as_str()))?;
        let period = remap::parse_period(&self.periode)?;
        let base_salary = parse_opt_amount("GajiPokok", self.gaji_pokok.as_deref())?;
        let allowance = parse_opt_amount("Tunjangan", self.tunjangan.as_deref())?;
        let overtime = parse_opt_amount("Lembur", self.lembur.as_deref())?;
        let deduction = parse_opt_amount("Potongan", self.potongan.as_deref())?;

        // Copy the legacy total; only derive it when the legacy row never stored one.
        let net_pay = match parse_opt_amount("Total", self.total.as_deref())? {
            0 => base_salary + allowance + overtime - deduction,
            total => total,
        };

        Ok(Payroll {
            employee_id,
            period,
            base_salary,
            allowance,
            overtime,
            deduction,
            net_pay,
        })
    }
}

impl LegacyRecord for LegacyLeaveRequest {
    const TABLE: Table = Table::LeaveRequests;

    fn key(&self) -> String {
        code_key(&self.no_pengajuan)
    }
}

impl Transform for LegacyLeaveRequest {
    type Target = LeaveRequest;

    fn transform(&self, lookups: &mut Lookups) -> Result<LeaveRequest, RowError> {
        let request_no = required_key("NoPengajuan", &self.no_pengajuan)?;
        let employee_id = lookups
            .table(Table::Employees)
            .resolve_required(self.nik.as_deref())?;
        let kind = remap::leave_kind(self.jns_pengajuan.as_deref())?;
        let start_date = parse_opt_date("TglMulai", self.tgl_mulai.as_deref())?
            .ok_or(RowError::MissingValue { field: "TglMulai" })?;
        let end_date = parse_opt_date("TglSelesai", self.tgl_selesai.as_deref())?.unwrap_or(start_date);
        if end_date < start_date {
            return Err(RowError::InvalidDate {
                field: "TglSelesai",
                value: end_date.to_string(),
            });
        }
        let days = (end_date - start_date).num_days() as i32 + 1;

        Ok(LeaveRequest {
            request_no,
            employee_id,
            kind,
            start_date,
            end_date,
            days,
            reason: clean_text(self.alasan.as_deref()),
            status: remap::approval_status(self.status.as_deref())?,
            approver_id: lookups
                .table(Table::Employees)
                .resolve_optional(self.approver.as_deref()),
            submitted_at: parse_opt_date("TglPengajuan", self.tgl_pengajuan.as_deref())?,
        })
    }
}

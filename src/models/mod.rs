use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString};

// Legacy rows, as read from the MySQL HRIS. Everything textual stays a String so
// zero dates and odd codes survive until the transform step decides about them.

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyDivision {
    pub kd_bag: String,
    pub nm_bag: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyDepartment {
    pub kd_dept: String,
    pub nm_dept: Option<String>,
    pub kd_bag: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacySection {
    pub kd_sie: String,
    pub nm_sie: Option<String>,
    pub kd_dept: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyShiftType {
    pub kd_jam: String,
    pub keterangan: Option<String>,
    pub jam_masuk: Option<String>,
    pub jam_keluar: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyShiftGroup {
    pub kd_group: String,
    pub nm_group: Option<String>,
    pub kd_jam: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegacyEmployee {
    pub nik: String,
    pub nama: Option<String>,
    pub jen_kel: Option<String>,
    pub tgl_lahir: Option<String>,
    pub agama: Option<String>,
    pub status_nikah: Option<String>,
    pub tgl_masuk: Option<String>,
    pub tgl_keluar: Option<String>,
    pub status_karyawan: Option<String>,
    pub kd_bag: Option<String>,
    pub kd_dept: Option<String>,
    pub kd_sie: Option<String>,
    pub kd_group: Option<String>,
    pub aktif: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegacyAttendance {
    pub nik: String,
    pub tanggal: String,
    pub jam_masuk: Option<String>,
    pub jam_keluar: Option<String>,
    pub kd_jam: Option<String>,
    pub status: Option<String>,
    pub keterangan: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegacyPayroll {
    pub nik: String,
    pub periode: String,
    pub gaji_pokok: Option<String>,
    pub tunjangan: Option<String>,
    pub lembur: Option<String>,
    pub potongan: Option<String>,
    pub total: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegacyLeaveRequest {
    pub no_pengajuan: String,
    pub nik: Option<String>,
    pub jns_pengajuan: Option<String>,
    pub tgl_mulai: Option<String>,
    pub tgl_selesai: Option<String>,
    pub alasan: Option<String>,
    pub status: Option<String>,
    pub approver: Option<String>,
    pub tgl_pengajuan: Option<String>,
}

// Target enums. Stored as TEXT, spelled the way the application's ORM spells them.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Religion {
    Islam,
    Protestant,
    Catholic,
    Hindu,
    Buddhist,
    Confucian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentStatus {
    Permanent,
    Contract,
    Daily,
    Probation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    Sick,
    Permission,
    Absent,
    Leave,
    Holiday,
    BusinessTrip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveKind {
    AnnualLeave,
    Permission,
    SickLeave,
    BusinessTrip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

// Target rows, ready to be bound into an upsert. Foreign keys are already backfilled.

#[derive(Debug, Clone, PartialEq)]
pub struct Division {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Department {
    pub code: String,
    pub name: String,
    pub division_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub code: String,
    pub name: String,
    pub department_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShiftType {
    pub code: String,
    pub name: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub crosses_midnight: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShiftGroup {
    pub code: String,
    pub name: String,
    pub shift_type_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub empl_id: String,
    pub name: String,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub religion: Option<Religion>,
    pub marital_status: Option<MaritalStatus>,
    pub hire_date: Option<NaiveDate>,
    pub resign_date: Option<NaiveDate>,
    pub employment_status: EmploymentStatus,
    pub is_active: bool,
    pub division_id: Option<i32>,
    pub department_id: Option<i32>,
    pub section_id: Option<i32>,
    pub shift_group_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attendance {
    pub employee_id: i32,
    pub work_date: NaiveDate,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub shift_type_id: Option<i32>,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Payroll {
    pub employee_id: i32,
    pub period: String,
    pub base_salary: i64,
    pub allowance: i64,
    pub overtime: i64,
    pub deduction: i64,
    pub net_pay: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaveRequest {
    pub request_no: String,
    pub employee_id: i32,
    pub kind: LeaveKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i32,
    pub reason: Option<String>,
    pub status: ApprovalStatus,
    pub approver_id: Option<i32>,
    pub submitted_at: Option<NaiveDate>,
}

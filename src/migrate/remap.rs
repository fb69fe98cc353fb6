// Legacy value remapping: codes to enums, text dates/times/amounts to typed values.

use chrono::{NaiveDate, NaiveTime};

use crate::error::RowError;
use crate::models::{
    ApprovalStatus, AttendanceStatus, EmploymentStatus, Gender, LeaveKind, MaritalStatus,
    Religion,
};

/// Trims and upper-cases a legacy code. Blank codes are treated as absent.
pub fn normalize_code(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

pub fn normalize_opt_code(value: Option<&str>) -> Option<String> {
    value.and_then(normalize_code)
}

/// Trims free text, keeping its case.
pub fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn required_code<T>(
    field: &'static str,
    value: Option<&str>,
    map: fn(&str) -> Option<T>,
) -> Result<T, RowError> {
    let code = normalize_opt_code(value).ok_or(RowError::MissingValue { field })?;
    map(&code).ok_or(RowError::UnknownCode { field, value: code })
}

fn gender_code(code: &str) -> Option<Gender> {
    match code {
        "L" | "M" | "LAKI-LAKI" | "LAKI LAKI" | "PRIA" | "MALE" => Some(Gender::Male),
        "P" | "F" | "PEREMPUAN" | "WANITA" | "FEMALE" => Some(Gender::Female),
        _ => None,
    }
}

pub fn gender(value: Option<&str>) -> Option<Gender> {
    normalize_opt_code(value).and_then(|c| gender_code(&c))
}

fn religion_code(code: &str) -> Option<Religion> {
    match code {
        "1" | "ISLAM" => Some(Religion::Islam),
        "2" | "KRISTEN" | "PROTESTAN" | "KRISTEN PROTESTAN" => Some(Religion::Protestant),
        "3" | "KATOLIK" | "KATHOLIK" | "KRISTEN KATOLIK" => Some(Religion::Catholic),
        "4" | "HINDU" => Some(Religion::Hindu),
        "5" | "BUDHA" | "BUDDHA" => Some(Religion::Buddhist),
        "6" | "KONGHUCU" | "KHONGHUCU" => Some(Religion::Confucian),
        _ => None,
    }
}

pub fn religion(value: Option<&str>) -> Option<Religion> {
    normalize_opt_code(value).and_then(|c| religion_code(&c))
}

fn marital_code(code: &str) -> Option<MaritalStatus> {
    match code {
        "KAWIN" | "MENIKAH" | "M" => Some(MaritalStatus::Married),
        "BELUM KAWIN" | "BK" | "LAJANG" | "S" => Some(MaritalStatus::Single),
        "J" | "D" | "CERAI" | "JANDA" | "DUDA" => Some(MaritalStatus::Divorced),
        c if is_tax_status(c, "TK") => Some(MaritalStatus::Single),
        c if is_tax_status(c, "K") => Some(MaritalStatus::Married),
        _ => None,
    }
}

/// PTKP tax-status spellings: `K`, `K/1`, `K2`, with an optional dependant count.
fn is_tax_status(code: &str, prefix: &str) -> bool {
    let Some(rest) = code.strip_prefix(prefix) else {
        return false;
    };
    let dependants = rest.strip_prefix('/').unwrap_or(rest);
    (rest.is_empty() || !dependants.is_empty()) && dependants.chars().all(|c| c.is_ascii_digit())
}

pub fn marital_status(value: Option<&str>) -> Option<MaritalStatus> {
    normalize_opt_code(value).and_then(|c| marital_code(&c))
}

fn employment_code(code: &str) -> Option<EmploymentStatus> {
    match code {
        "T" | "TETAP" => Some(EmploymentStatus::Permanent),
        "K" | "KONTRAK" | "PKWT" => Some(EmploymentStatus::Contract),
        "H" | "HARIAN" | "HL" => Some(EmploymentStatus::Daily),
        "P" | "PERCOBAAN" | "TRAINING" => Some(EmploymentStatus::Probation),
        _ => None,
    }
}

pub fn employment_status(value: Option<&str>) -> Result<EmploymentStatus, RowError> {
    required_code("StatusKaryawan", value, employment_code)
}

/// Explicit flags win; an empty flag means "active unless a resign date is recorded".
pub fn active_flag(value: Option<&str>, resign_date: Option<NaiveDate>) -> Result<bool, RowError> {
    match normalize_opt_code(value).as_deref() {
        None => Ok(resign_date.is_none()),
        Some("Y" | "YA" | "1" | "T" | "AKTIF") => Ok(true),
        Some("N" | "TIDAK" | "0" | "F" | "NONAKTIF") => Ok(false),
        Some(other) => Err(RowError::UnknownCode {
            field: "Aktif",
            value: other.to_string(),
        }),
    }
}

fn attendance_code(code: &str) -> Option<AttendanceStatus> {
    match code {
        "H" | "HADIR" => Some(AttendanceStatus::Present),
        "T" | "TERLAMBAT" => Some(AttendanceStatus::Late),
        "S" | "SAKIT" => Some(AttendanceStatus::Sick),
        "I" | "IZIN" | "IJIN" => Some(AttendanceStatus::Permission),
        "A" | "ALPA" | "ALPHA" | "MANGKIR" => Some(AttendanceStatus::Absent),
        "C" | "CUTI" => Some(AttendanceStatus::Leave),
        "L" | "LIBUR" => Some(AttendanceStatus::Holiday),
        "D" | "DINAS" | "DL" => Some(AttendanceStatus::BusinessTrip),
        _ => None,
    }
}

pub fn attendance_status(value: Option<&str>) -> Result<AttendanceStatus, RowError> {
    required_code("Status", value, attendance_code)
}

fn leave_code(code: &str) -> Option<LeaveKind> {
    match code {
        "C" | "CUTI" => Some(LeaveKind::AnnualLeave),
        "I" | "IZIN" | "IJIN" => Some(LeaveKind::Permission),
        "S" | "SAKIT" => Some(LeaveKind::SickLeave),
        "D" | "DINAS" => Some(LeaveKind::BusinessTrip),
        _ => None,
    }
}

pub fn leave_kind(value: Option<&str>) -> Result<LeaveKind, RowError> {
    required_code("JnsPengajuan", value, leave_code)
}

fn approval_code(code: &str) -> Option<ApprovalStatus> {
    match code {
        "0" | "P" | "PENDING" | "MENUNGGU" => Some(ApprovalStatus::Pending),
        "1" | "A" | "Y" | "APPROVED" | "DISETUJUI" => Some(ApprovalStatus::Approved),
        "2" | "R" | "N" | "REJECTED" | "DITOLAK" => Some(ApprovalStatus::Rejected),
        "3" | "B" | "BATAL" | "CANCELLED" => Some(ApprovalStatus::Cancelled),
        _ => None,
    }
}

/// A request with no recorded decision is still pending.
pub fn approval_status(value: Option<&str>) -> Result<ApprovalStatus, RowError> {
    match normalize_opt_code(value) {
        None => Ok(ApprovalStatus::Pending),
        Some(code) => approval_code(&code).ok_or(RowError::UnknownCode {
            field: "Status",
            value: code,
        }),
    }
}

/// Parses `YYYY-MM-DD`, optionally followed by a time. MySQL zero dates become `None`.
pub fn parse_legacy_date(field: &'static str, value: &str) -> Result<Option<NaiveDate>, RowError> {
    let trimmed = value.trim();
    let date_part = trimmed.split([' ', 'T']).next().unwrap_or_default();
    if date_part.is_empty() || date_part == "0000-00-00" {
        return Ok(None);
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| RowError::InvalidDate {
            field,
            value: trimmed.to_string(),
        })
}

pub fn parse_opt_date(field: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>, RowError> {
    match value {
        Some(v) => parse_legacy_date(field, v),
        None => Ok(None),
    }
}

/// Parses `HH:MM[:SS]`, also the time half of a DATETIME. Midnight is a real value.
pub fn parse_legacy_time(field: &'static str, value: &str) -> Result<Option<NaiveTime>, RowError> {
    let trimmed = value.trim();
    let time_part = trimmed.rsplit(' ').next().unwrap_or_default();
    if time_part.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(time_part, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time_part, "%H:%M"))
        .map(Some)
        .map_err(|_| RowError::InvalidTime {
            field,
            value: trimmed.to_string(),
        })
}

pub fn parse_opt_time(field: &'static str, value: Option<&str>) -> Result<Option<NaiveTime>, RowError> {
    match value {
        Some(v) => parse_legacy_time(field, v),
        None => Ok(None),
    }
}

/// Parses a rupiah amount to whole units, rounding half away from zero.
/// Accepts `1500000.00`, `1,500,000` and `1.500.000`; blank is zero.
pub fn parse_amount(field: &'static str, value: &str) -> Result<i64, RowError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let invalid = || RowError::InvalidAmount {
        field,
        value: trimmed.to_string(),
    };

    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let mut cleaned: String = digits.chars().filter(|c| *c != ',').collect();
    if cleaned.matches('.').count() > 1 {
        cleaned.retain(|c| c != '.');
    }

    let (whole, fraction) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let mut amount: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    if fraction.chars().next().is_some_and(|d| d >= '5') {
        amount = amount.checked_add(1).ok_or_else(invalid)?;
    }
    Ok(if negative { -amount } else { amount })
}

pub fn parse_opt_amount(field: &'static str, value: Option<&str>) -> Result<i64, RowError> {
    value.map_or(Ok(0), |v| parse_amount(field, v))
}

/// `202401` or `2024-01` to `2024-01`.
pub fn parse_period(value: &str) -> Result<String, RowError> {
    let trimmed = value.trim();
    let invalid = || RowError::InvalidPeriod(trimmed.to_string());
    if !trimmed.is_ascii() {
        return Err(invalid());
    }

    let (year, month) = match trimmed.len() {
        6 => (&trimmed[..4], &trimmed[4..]),
        7 if trimmed.as_bytes()[4] == b'-' => (&trimmed[..4], &trimmed[5..]),
        _ => return Err(invalid()),
    };
    let year: u32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1900..=9999).contains(&year) || !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok(format!("{:04}-{:02}", year, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_trimmed_and_uppercased() {
        assert_eq!(normalize_code("  bag01 "), Some("BAG01".to_string()));
        assert_eq!(normalize_code("   "), None);
        assert_eq!(clean_text(Some("  Produksi ")), Some("Produksi".to_string()));
        assert_eq!(clean_text(Some("")), None);
    }

    #[test]
    fn gender_accepts_indonesian_and_english_spellings() {
        assert_eq!(gender(Some("L")), Some(Gender::Male));
        assert_eq!(gender(Some(" p ")), Some(Gender::Female));
        assert_eq!(gender(Some("Laki-Laki")), Some(Gender::Male));
        assert_eq!(gender(Some("perempuan")), Some(Gender::Female));
        assert_eq!(gender(Some("X")), None);
        assert_eq!(gender(None), None);
    }

    #[test]
    fn religion_accepts_numeric_and_named_codes() {
        assert_eq!(religion(Some("1")), Some(Religion::Islam));
        assert_eq!(religion(Some("Kristen")), Some(Religion::Protestant));
        assert_eq!(religion(Some("katolik")), Some(Religion::Catholic));
        assert_eq!(religion(Some("BUDHA")), Some(Religion::Buddhist));
        assert_eq!(religion(Some("6")), Some(Religion::Confucian));
        assert_eq!(religion(Some("9")), None);
    }

    #[test]
    fn marital_status_understands_tax_status_codes() {
        assert_eq!(marital_status(Some("TK/0")), Some(MaritalStatus::Single));
        assert_eq!(marital_status(Some("K/2")), Some(MaritalStatus::Married));
        assert_eq!(marital_status(Some("kawin")), Some(MaritalStatus::Married));
        assert_eq!(marital_status(Some("Belum Kawin")), Some(MaritalStatus::Single));
        assert_eq!(marital_status(Some("cerai")), Some(MaritalStatus::Divorced));
        assert_eq!(marital_status(Some("?")), None);
    }

    #[test]
    fn marital_status_ignores_other_k_words() {
        assert_eq!(marital_status(Some("K")), Some(MaritalStatus::Married));
        assert_eq!(marital_status(Some("k3")), Some(MaritalStatus::Married));
        assert_eq!(marital_status(Some("TK")), Some(MaritalStatus::Single));
        assert_eq!(marital_status(Some("KOSONG")), None);
        assert_eq!(marital_status(Some("K/")), None);
        assert_eq!(marital_status(Some("TKX")), None);
    }

    #[test]
    fn employment_status_is_required() {
        assert_eq!(employment_status(Some("t")), Ok(EmploymentStatus::Permanent));
        assert_eq!(employment_status(Some("KONTRAK")), Ok(EmploymentStatus::Contract));
        assert_eq!(
            employment_status(Some("Z")),
            Err(RowError::UnknownCode {
                field: "StatusKaryawan",
                value: "Z".to_string()
            })
        );
        assert_eq!(
            employment_status(Some(" ")),
            Err(RowError::MissingValue { field: "StatusKaryawan" })
        );
    }

    #[test]
    fn active_flag_falls_back_to_resign_date() {
        let resigned = NaiveDate::from_ymd_opt(2020, 5, 1);
        assert_eq!(active_flag(Some("Y"), resigned), Ok(true));
        assert_eq!(active_flag(Some("0"), None), Ok(false));
        assert_eq!(active_flag(None, None), Ok(true));
        assert_eq!(active_flag(Some(""), resigned), Ok(false));
        assert!(active_flag(Some("MAYBE"), None).is_err());
    }

    #[test]
    fn attendance_status_covers_every_legacy_letter() {
        let expected = [
            ("H", AttendanceStatus::Present),
            ("T", AttendanceStatus::Late),
            ("S", AttendanceStatus::Sick),
            ("I", AttendanceStatus::Permission),
            ("A", AttendanceStatus::Absent),
            ("C", AttendanceStatus::Leave),
            ("L", AttendanceStatus::Holiday),
            ("D", AttendanceStatus::BusinessTrip),
        ];
        for (code, status) in expected {
            assert_eq!(attendance_status(Some(code)), Ok(status));
            assert_eq!(attendance_status(Some(code.to_lowercase().as_str())), Ok(status));
        }
        assert!(attendance_status(Some("Q")).is_err());
    }

    #[test]
    fn leave_kind_and_approval() {
        assert_eq!(leave_kind(Some("cuti")), Ok(LeaveKind::AnnualLeave));
        assert_eq!(leave_kind(Some("S")), Ok(LeaveKind::SickLeave));
        assert!(leave_kind(None).is_err());
        assert_eq!(approval_status(Some("1")), Ok(ApprovalStatus::Approved));
        assert_eq!(approval_status(Some("2")), Ok(ApprovalStatus::Rejected));
        assert_eq!(approval_status(None), Ok(ApprovalStatus::Pending));
        assert!(approval_status(Some("7")).is_err());
    }

    #[test]
    fn enum_text_matches_target_spelling() {
        assert_eq!(AttendanceStatus::BusinessTrip.to_string(), "BUSINESS_TRIP");
        assert_eq!(LeaveKind::AnnualLeave.to_string(), "ANNUAL_LEAVE");
        assert_eq!(Gender::Female.to_string(), "FEMALE");
    }

    #[test]
    fn zero_and_blank_dates_are_absent() {
        assert_eq!(parse_legacy_date("Tanggal", "0000-00-00"), Ok(None));
        assert_eq!(parse_legacy_date("Tanggal", "0000-00-00 00:00:00"), Ok(None));
        assert_eq!(parse_legacy_date("Tanggal", "  "), Ok(None));
        assert_eq!(
            parse_legacy_date("Tanggal", "2024-01-05 08:00:00"),
            Ok(NaiveDate::from_ymd_opt(2024, 1, 5))
        );
        assert_eq!(
            parse_legacy_date("Tanggal", "2024-01-05T08:00:00"),
            Ok(NaiveDate::from_ymd_opt(2024, 1, 5))
        );
    }

    #[test]
    fn impossible_dates_are_errors() {
        assert_eq!(
            parse_legacy_date("TglLahir", "2023-02-30"),
            Err(RowError::InvalidDate {
                field: "TglLahir",
                value: "2023-02-30".to_string()
            })
        );
        assert!(parse_legacy_date("TglLahir", "2020-00-00").is_err());
    }

    #[test]
    fn times_keep_midnight() {
        assert_eq!(parse_legacy_time("JamMasuk", "07:30"), Ok(NaiveTime::from_hms_opt(7, 30, 0)));
        assert_eq!(parse_legacy_time("JamMasuk", "00:00:00"), Ok(NaiveTime::from_hms_opt(0, 0, 0)));
        assert_eq!(
            parse_legacy_time("JamMasuk", "2024-01-05 16:45:10"),
            Ok(NaiveTime::from_hms_opt(16, 45, 10))
        );
        assert_eq!(parse_legacy_time("JamMasuk", ""), Ok(None));
        assert!(parse_legacy_time("JamMasuk", "25:00:00").is_err());
    }

    #[test]
    fn amounts_round_half_away_from_zero() {
        assert_eq!(parse_amount("GajiPokok", "1500000.00"), Ok(1_500_000));
        assert_eq!(parse_amount("GajiPokok", "1,500,000"), Ok(1_500_000));
        assert_eq!(parse_amount("GajiPokok", "1.500.000"), Ok(1_500_000));
        assert_eq!(parse_amount("GajiPokok", "10.5"), Ok(11));
        assert_eq!(parse_amount("GajiPokok", "10.49"), Ok(10));
        assert_eq!(parse_amount("Potongan", "-12.5"), Ok(-13));
        assert_eq!(parse_amount("Potongan", ""), Ok(0));
        assert!(parse_amount("Potongan", "abc").is_err());
        assert!(parse_amount("Potongan", ".").is_err());
    }

    #[test]
    fn periods_normalize_to_year_month() {
        assert_eq!(parse_period("202401"), Ok("2024-01".to_string()));
        assert_eq!(parse_period("2024-12"), Ok("2024-12".to_string()));
        assert_eq!(parse_period("202413"), Err(RowError::InvalidPeriod("202413".to_string())));
        assert!(parse_period("2024").is_err());
        assert!(parse_period("2024/01").is_err());
    }
}

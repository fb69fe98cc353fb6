use anyhow::{Context, Result};
use mysql_async::prelude::*;
use mysql_async::Row;
use std::collections::HashSet;
use std::io::Write;

use crate::migrate::plan::Table;
use crate::migrate::transform::LegacyRecord;
use crate::models::*;

/// A legacy table that can be read with one plain query.
///
/// Queries use the text protocol, so every column arrives as bytes (or NULL);
/// dates and times are formatted server side to keep zero dates visible.
pub trait LegacyQuery: LegacyRecord + Sized {
    const QUERY: &'static str;

    fn from_row(row: &Row) -> Self;
}

// Latin-1 legacy data is common; decode lossily rather than dropping the row.
fn text(row: &Row, idx: usize) -> Option<String> {
    match row.get_opt::<Option<Vec<u8>>, usize>(idx) {
        Some(Ok(Some(bytes))) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        _ => None,
    }
}

fn key_text(row: &Row, idx: usize) -> String {
    text(row, idx).unwrap_or_default()
}

/// Fetches every row of a legacy table in key order.
pub async fn fetch_legacy<T: LegacyQuery>(conn: &mut mysql_async::Conn) -> Result<Vec<T>> {
    let label = T::TABLE.legacy_name();

    eprint!("\rFetching MySQL {} records: 0", label);
    std::io::stderr().flush().ok();

    let result = conn
        .query_iter(T::QUERY)
        .await
        .with_context(|| format!("Failed to query legacy table {}", label))?;
    let raw: Vec<Row> = result
        .collect_and_drop()
        .await
        .with_context(|| format!("Failed to read legacy table {}", label))?;

    let mut rows = Vec::with_capacity(raw.len());
    for row in &raw {
        rows.push(T::from_row(row));
        if rows.len() % 1000 == 0 {
            eprint!("\rFetching MySQL {} records: {}", label, rows.len());
            std::io::stderr().flush().ok();
        }
    }

    eprint!("\rFetched {} MySQL {} records           \n", rows.len(), label);

    Ok(rows)
}

pub async fn count(conn: &mut mysql_async::Conn, table: Table) -> Result<i64> {
    let query = format!("SELECT COUNT(*) FROM {}", table.legacy_name());
    let count: i64 = conn.query_first(query).await?.unwrap_or(0);
    Ok(count)
}

/// Lower-cased names of the tables in the connected schema.
pub async fn existing_tables(conn: &mut mysql_async::Conn) -> Result<HashSet<String>> {
    let names: Vec<String> = conn
        .query("SELECT table_name FROM information_schema.tables WHERE table_schema = DATABASE()")
        .await
        .context("Failed to list legacy tables")?;
    Ok(names.into_iter().map(|n| n.to_lowercase()).collect())
}

impl LegacyQuery for LegacyDivision {
    const QUERY: &'static str = "SELECT KdBag, NmBag FROM mstbag \
         WHERE KdBag IS NOT NULL AND TRIM(KdBag) <> '' ORDER BY KdBag";

    fn from_row(row: &Row) -> Self {
        LegacyDivision {
            kd_bag: key_text(row, 0),
            nm_bag: text(row, 1),
        }
    }
}

impl LegacyQuery for LegacyDepartment {
    const QUERY: &'static str = "SELECT KdDept, NmDept, KdBag FROM mstdept \
         WHERE KdDept IS NOT NULL AND TRIM(KdDept) <> '' ORDER BY KdDept";

    fn from_row(row: &Row) -> Self {
        LegacyDepartment {
            kd_dept: key_text(row, 0),
            nm_dept: text(row, 1),
            kd_bag: text(row, 2),
        }
    }
}

impl LegacyQuery for LegacySection {
    const QUERY: &'static str = "SELECT KdSie, NmSie, KdDept FROM mstsie \
         WHERE KdSie IS NOT NULL AND TRIM(KdSie) <> '' ORDER BY KdSie";

    fn from_row(row: &Row) -> Self {
        LegacySection {
            kd_sie: key_text(row, 0),
            nm_sie: text(row, 1),
            kd_dept: text(row, 2),
        }
    }
}

impl LegacyQuery for LegacyShiftType {
    const QUERY: &'static str = "SELECT KdJam, Keterangan, \
         TIME_FORMAT(JamMasuk, '%H:%i:%s'), TIME_FORMAT(JamKeluar, '%H:%i:%s') \
         FROM jnsjam WHERE KdJam IS NOT NULL AND TRIM(KdJam) <> '' ORDER BY KdJam";

    fn from_row(row: &Row) -> Self {
        LegacyShiftType {
            kd_jam: key_text(row, 0),
            keterangan: text(row, 1),
            jam_masuk: text(row, 2),
            jam_keluar: text(row, 3),
        }
    }
}

impl LegacyQuery for LegacyShiftGroup {
    const QUERY: &'static str = "SELECT KdGroup, NmGroup, KdJam FROM groupshift \
         WHERE KdGroup IS NOT NULL AND TRIM(KdGroup) <> '' ORDER BY KdGroup";

    fn from_row(row: &Row) -> Self {
        LegacyShiftGroup {
            kd_group: key_text(row, 0),
            nm_group: text(row, 1),
            kd_jam: text(row, 2),
        }
    }
}

impl LegacyQuery for LegacyEmployee {
    const QUERY: &'static str = "SELECT NIK, Nama, JenKel, DATE_FORMAT(TglLahir, '%Y-%m-%d'), Agama, \
         StatusNikah, DATE_FORMAT(TglMasuk, '%Y-%m-%d'), DATE_FORMAT(TglKeluar, '%Y-%m-%d'), \
         StatusKaryawan, KdBag, KdDept, KdSie, KdGroup, Aktif \
         FROM karyawan WHERE NIK IS NOT NULL AND TRIM(NIK) <> '' ORDER BY NIK";

    fn from_row(row: &Row) -> Self {
        LegacyEmployee {
            nik: key_text(row, 0),
            nama: text(row, 1),
            jen_kel: text(row, 2),
            tgl_lahir: text(row, 3),
            agama: text(row, 4),
            status_nikah: text(row, 5),
            tgl_masuk: text(row, 6),
            tgl_keluar: text(row, 7),
            status_karyawan: text(row, 8),
            kd_bag: text(row, 9),
            kd_dept: text(row, 10),
            kd_sie: text(row, 11),
            kd_group: text(row, 12),
            aktif: text(row, 13),
        }
    }
}

impl LegacyQuery for LegacyAttendance {
    const QUERY: &'static str = "SELECT NIK, DATE_FORMAT(Tanggal, '%Y-%m-%d'), \
         TIME_FORMAT(JamMasuk, '%H:%i:%s'), TIME_FORMAT(JamKeluar, '%H:%i:%s'), \
         KdJam, Status, Keterangan \
         FROM absent WHERE NIK IS NOT NULL AND Tanggal IS NOT NULL ORDER BY NIK, Tanggal";

    fn from_row(row: &Row) -> Self {
        LegacyAttendance {
            nik: key_text(row, 0),
            tanggal: key_text(row, 1),
            jam_masuk: text(row, 2),
            jam_keluar: text(row, 3),
            kd_jam: text(row, 4),
            status: text(row, 5),
            keterangan: text(row, 6),
        }
    }
}

impl LegacyQuery for LegacyPayroll {
    const QUERY: &'static str = "SELECT NIK, Periode, GajiPokok, Tunjangan, Lembur, Potongan, Total \
         FROM gaji WHERE NIK IS NOT NULL AND Periode IS NOT NULL ORDER BY NIK, Periode";

    fn from_row(row: &Row) -> Self {
        LegacyPayroll {
            nik: key_text(row, 0),
            periode: key_text(row, 1),
            gaji_pokok: text(row, 2),
            tunjangan: text(row, 3),
            lembur: text(row, 4),
            potongan: text(row, 5),
            total: text(row, 6),
        }
    }
}

impl LegacyQuery for LegacyLeaveRequest {
    const QUERY: &'static str = "SELECT NoPengajuan, NIK, JnsPengajuan, \
         DATE_FORMAT(TglMulai, '%Y-%m-%d'), DATE_FORMAT(TglSelesai, '%Y-%m-%d'), Alasan, Status, \
         Approver, DATE_FORMAT(TglPengajuan, '%Y-%m-%d %H:%i:%s') \
         FROM pengajuan WHERE NoPengajuan IS NOT NULL AND TRIM(NoPengajuan) <> '' ORDER BY NoPengajuan";

    fn from_row(row: &Row) -> Self {
        LegacyLeaveRequest {
            no_pengajuan: key_text(row, 0),
            nik: text(row, 1),
            jns_pengajuan: text(row, 2),
            tgl_mulai: text(row, 3),
            tgl_selesai: text(row, 4),
            alasan: text(row, 5),
            status: text(row, 6),
            approver: text(row, 7),
            tgl_pengajuan: text(row, 8),
        }
    }
}

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::Serialize;

/// Every table the migration knows, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Divisions,
    Departments,
    Sections,
    ShiftTypes,
    ShiftGroups,
    Employees,
    Attendances,
    Payrolls,
    LeaveRequests,
}

impl Table {
    pub const ALL: [Table; 9] = [
        Table::Divisions,
        Table::Departments,
        Table::Sections,
        Table::ShiftTypes,
        Table::ShiftGroups,
        Table::Employees,
        Table::Attendances,
        Table::Payrolls,
        Table::LeaveRequests,
    ];

    pub fn legacy_name(self) -> &'static str {
        match self {
            Table::Divisions => "mstbag",
            Table::Departments => "mstdept",
            Table::Sections => "mstsie",
            Table::ShiftTypes => "jnsjam",
            Table::ShiftGroups => "groupshift",
            Table::Employees => "karyawan",
            Table::Attendances => "absent",
            Table::Payrolls => "gaji",
            Table::LeaveRequests => "pengajuan",
        }
    }

    pub fn target_name(self) -> &'static str {
        match self {
            Table::Divisions => "divisions",
            Table::Departments => "departments",
            Table::Sections => "sections",
            Table::ShiftTypes => "shift_types",
            Table::ShiftGroups => "shift_groups",
            Table::Employees => "employees",
            Table::Attendances => "attendances",
            Table::Payrolls => "payrolls",
            Table::LeaveRequests => "leave_requests",
        }
    }

    /// Tables whose code lookups this table's rows are backfilled from.
    pub fn dependencies(self) -> &'static [Table] {
        match self {
            Table::Divisions | Table::ShiftTypes => &[],
            Table::Departments => &[Table::Divisions],
            Table::Sections => &[Table::Departments],
            Table::ShiftGroups => &[Table::ShiftTypes],
            Table::Employees => &[
                Table::Divisions,
                Table::Departments,
                Table::Sections,
                Table::ShiftGroups,
            ],
            Table::Attendances => &[Table::Employees, Table::ShiftTypes],
            Table::Payrolls | Table::LeaveRequests => &[Table::Employees],
        }
    }

    fn position(self) -> usize {
        Table::ALL.iter().position(|t| *t == self).unwrap_or(usize::MAX)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target_name())
    }
}

impl FromStr for Table {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        for table in Table::ALL {
            if wanted == table.target_name() || wanted == table.legacy_name() {
                return Ok(table);
            }
        }
        let valid: Vec<&str> = Table::ALL.iter().map(|t| t.target_name()).collect();
        bail!("unknown table {:?}, expected one of: {}", s, valid.join(", "))
    }
}

/// The ordered set of tables one run will touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    tables: Vec<Table>,
}

impl Plan {
    pub fn all() -> Self {
        Plan {
            tables: Table::ALL.to_vec(),
        }
    }

    /// Dedupes and orders a selection. An empty selection means everything.
    pub fn from_selection(selection: &[Table]) -> Self {
        if selection.is_empty() {
            return Plan::all();
        }
        let mut tables = selection.to_vec();
        tables.sort_by_key(|t| t.position());
        tables.dedup();
        Plan { tables }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn contains(&self, table: Table) -> bool {
        self.tables.contains(&table)
    }

    /// Dependencies that this run will not refresh itself; their lookups must
    /// already be populated in the target.
    pub fn external_dependencies(&self) -> Vec<Table> {
        let mut external: Vec<Table> = self
            .tables
            .iter()
            .flat_map(|t| t.dependencies().iter().copied())
            .filter(|dep| !self.contains(*dep))
            .collect();
        external.sort_by_key(|t| t.position());
        external.dedup();
        external
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependencies_always_come_first() {
        for (idx, table) in Table::ALL.iter().enumerate() {
            for dep in table.dependencies() {
                let dep_idx = Table::ALL.iter().position(|t| t == dep).unwrap();
                assert!(dep_idx < idx, "{} must precede {}", dep, table);
            }
        }
    }

    #[test]
    fn parses_target_legacy_and_kebab_names() {
        assert_eq!("employees".parse::<Table>().unwrap(), Table::Employees);
        assert_eq!("KARYAWAN".parse::<Table>().unwrap(), Table::Employees);
        assert_eq!("leave-requests".parse::<Table>().unwrap(), Table::LeaveRequests);
        assert_eq!(" mstsie ".parse::<Table>().unwrap(), Table::Sections);

        let err = "salaries".parse::<Table>().unwrap_err().to_string();
        assert!(err.contains("payrolls"), "{}", err);
    }

    #[test]
    fn selection_is_ordered_and_deduped() {
        let plan = Plan::from_selection(&[Table::Payrolls, Table::Divisions, Table::Payrolls]);
        assert_eq!(plan.tables(), &[Table::Divisions, Table::Payrolls]);
        assert_eq!(Plan::from_selection(&[]), Plan::all());
    }

    #[test]
    fn external_dependencies_are_reported() {
        let plan = Plan::from_selection(&[Table::Attendances, Table::ShiftTypes]);
        assert_eq!(plan.external_dependencies(), vec![Table::Employees]);
        assert!(Plan::all().external_dependencies().is_empty());
    }
}

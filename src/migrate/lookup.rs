use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::RowError;
use crate::migrate::plan::Table;
use crate::migrate::remap::normalize_opt_code;

/// Legacy code -> target surrogate id, for one target table.
#[derive(Debug, Clone)]
pub struct CodeLookup {
    table: Table,
    ids: HashMap<String, i32>,
    unresolved: BTreeMap<String, usize>,
}

impl CodeLookup {
    pub fn new(table: Table) -> Self {
        CodeLookup {
            table,
            ids: HashMap::new(),
            unresolved: BTreeMap::new(),
        }
    }

    pub fn from_pairs<I, S>(table: Table, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: AsRef<str>,
    {
        let mut lookup = CodeLookup::new(table);
        for (code, id) in pairs {
            lookup.insert(code.as_ref(), id);
        }
        lookup
    }

    pub fn insert(&mut self, code: &str, id: i32) {
        if let Some(code) = normalize_opt_code(Some(code)) {
            self.ids.insert(code, id);
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<i32> {
        normalize_opt_code(Some(code)).and_then(|c| self.ids.get(&c).copied())
    }

    /// Absent codes are fine; unknown codes null the FK and are counted.
    pub fn resolve_optional(&mut self, code: Option<&str>) -> Option<i32> {
        let code = normalize_opt_code(code)?;
        match self.ids.get(&code) {
            Some(id) => Some(*id),
            None => {
                *self.unresolved.entry(code).or_insert(0) += 1;
                None
            }
        }
    }

    /// Absent or unknown codes mean the row cannot be written yet.
    pub fn resolve_required(&mut self, code: Option<&str>) -> Result<i32, RowError> {
        let code = normalize_opt_code(code).ok_or(RowError::UnresolvedReference {
            table: self.table.target_name(),
            code: String::new(),
        })?;
        match self.ids.get(&code) {
            Some(id) => Ok(*id),
            None => {
                *self.unresolved.entry(code.clone()).or_insert(0) += 1;
                Err(RowError::UnresolvedReference {
                    table: self.table.target_name(),
                    code,
                })
            }
        }
    }

    pub fn unresolved(&self) -> &BTreeMap<String, usize> {
        &self.unresolved
    }
}

/// Unresolved codes for one lookup, as shown in a table report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedSummary {
    pub table: Table,
    pub distinct_codes: usize,
    pub occurrences: usize,
    pub sample: Vec<String>,
}

/// The lookups one table's transform needs.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    by_table: BTreeMap<Table, CodeLookup>,
}

impl Lookups {
    pub fn new() -> Self {
        Lookups::default()
    }

    pub fn with(mut self, lookup: CodeLookup) -> Self {
        self.insert(lookup);
        self
    }

    pub fn insert(&mut self, lookup: CodeLookup) {
        self.by_table.insert(lookup.table, lookup);
    }

    /// A lookup that was never loaded behaves as an empty one.
    pub fn table(&mut self, table: Table) -> &mut CodeLookup {
        self.by_table
            .entry(table)
            .or_insert_with(|| CodeLookup::new(table))
    }

    pub fn unresolved_summary(&self, sample: usize) -> Vec<UnresolvedSummary> {
        self.by_table
            .values()
            .filter(|l| !l.unresolved.is_empty())
            .map(|l| UnresolvedSummary {
                table: l.table,
                distinct_codes: l.unresolved.len(),
                occurrences: l.unresolved.values().sum(),
                sample: l.unresolved.keys().take(sample).cloned().collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn departments() -> CodeLookup {
        CodeLookup::from_pairs(Table::Departments, [("D01", 10), (" d02 ", 11)])
    }

    #[test]
    fn codes_match_case_insensitively() {
        let lookup = departments();
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get("d01"), Some(10));
        assert_eq!(lookup.get("D02"), Some(11));
        assert_eq!(lookup.get("D03"), None);
    }

    #[test]
    fn optional_references_null_and_count_unknown_codes() {
        let mut lookup = departments();
        assert_eq!(lookup.resolve_optional(Some("D01")), Some(10));
        assert_eq!(lookup.resolve_optional(None), None);
        assert_eq!(lookup.resolve_optional(Some("  ")), None);
        assert_eq!(lookup.resolve_optional(Some("x9")), None);
        assert_eq!(lookup.resolve_optional(Some("X9")), None);

        assert_eq!(lookup.unresolved().get("X9"), Some(&2));
        assert_eq!(lookup.unresolved().len(), 1);
    }

    #[test]
    fn required_references_skip_the_row() {
        let mut lookup = CodeLookup::from_pairs(Table::Employees, [("K0001", 1)]);
        assert_eq!(lookup.resolve_required(Some("k0001")), Ok(1));

        let err = lookup.resolve_required(Some("K0404")).unwrap_err();
        assert!(err.is_skip());
        assert_eq!(
            err,
            RowError::UnresolvedReference {
                table: "employees",
                code: "K0404".to_string()
            }
        );
        assert!(lookup.resolve_required(None).unwrap_err().is_skip());
    }

    #[test]
    fn summary_lists_only_lookups_with_misses() {
        let mut lookups = Lookups::new()
            .with(departments())
            .with(CodeLookup::from_pairs(Table::Divisions, [("B1", 1)]));
        lookups.table(Table::Departments).resolve_optional(Some("D77"));
        lookups.table(Table::Departments).resolve_optional(Some("D78"));
        lookups.table(Table::Departments).resolve_optional(Some("D77"));
        lookups.table(Table::Divisions).resolve_optional(Some("B1"));

        let summary = lookups.unresolved_summary(1);
        assert_eq!(
            summary,
            vec![UnresolvedSummary {
                table: Table::Departments,
                distinct_codes: 2,
                occurrences: 3,
                sample: vec!["D77".to_string()],
            }]
        );
    }

    #[test]
    fn unloaded_lookup_resolves_nothing() {
        let mut lookups = Lookups::new();
        assert_eq!(lookups.table(Table::ShiftGroups).resolve_optional(Some("G1")), None);
        assert_eq!(lookups.unresolved_summary(5).len(), 1);
    }
}

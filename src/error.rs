use thiserror::Error;

/// Why a single legacy row could not be written. Never fatal to a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("missing value for {field}")]
    MissingValue { field: &'static str },

    #[error("invalid date in {field}: {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("invalid time in {field}: {value:?}")]
    InvalidTime { field: &'static str, value: String },

    #[error("invalid amount in {field}: {value:?}")]
    InvalidAmount { field: &'static str, value: String },

    #[error("invalid payroll period {0:?}")]
    InvalidPeriod(String),

    #[error("unknown {field} code {value:?}")]
    UnknownCode { field: &'static str, value: String },

    #[error("unresolved {table} reference {code:?}")]
    UnresolvedReference { table: &'static str, code: String },

    #[error("database rejected row: {0}")]
    Database(String),
}

impl RowError {
    /// Rows whose owner is not in the target yet are skipped rather than failed.
    pub fn is_skip(&self) -> bool {
        matches!(self, RowError::UnresolvedReference { .. })
    }
}

impl From<tokio_postgres::Error> for RowError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.as_db_error() {
            Some(db) => RowError::Database(format!("{} ({})", db.message(), db.code().code())),
            None => RowError::Database(err.to_string()),
        }
    }
}

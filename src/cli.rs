use clap::{Args, Parser, Subcommand};

use crate::config::Overrides;
use crate::logging::Mode;
use crate::migrate::plan::{Plan, Table};

#[derive(Debug, Parser)]
#[command(name = "hris-migrate", version, about = "Moves the legacy HRIS database into the new schema")]
pub struct Cli {
    /// Tracing filter, e.g. `info` or `hris_migrate=debug`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// default, json, pretty or compact. Overrides LOG_FORMAT.
    #[arg(long, global = true, value_parser = parse_mode)]
    pub log_format: Option<Mode>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check the legacy tables and create the target schema.
    Prepare,
    /// Copy legacy rows into the target tables.
    Migrate(MigrateArgs),
    /// Compare legacy and target row by row key.
    Reconcile(ReconcileArgs),
    /// Show the latest ledger entry for every table.
    Status,
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Comma separated tables to migrate. Defaults to all of them.
    #[arg(long, value_delimiter = ',', value_parser = parse_table)]
    pub tables: Vec<Table>,

    /// Fetch and transform only, write nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Rows per transaction. Overrides MIGRATE_BATCH_SIZE.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Exit non-zero when any row fails.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    #[arg(long, value_delimiter = ',', value_parser = parse_table)]
    pub tables: Vec<Table>,

    /// Print the report as JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Missing keys and orphaned codes listed per table.
    #[arg(long, default_value_t = 10)]
    pub sample: usize,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        let batch_size = match &self.command {
            Command::Migrate(args) => args.batch_size,
            _ => None,
        };
        Overrides {
            batch_size,
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        }
    }

    /// JSON output owns stdout, so the banner and progress bars stay quiet.
    pub fn is_machine_output(&self) -> bool {
        matches!(&self.command, Command::Reconcile(args) if args.json)
    }
}

impl MigrateArgs {
    pub fn plan(&self) -> Plan {
        Plan::from_selection(&self.tables)
    }
}

impl ReconcileArgs {
    pub fn plan(&self) -> Plan {
        Plan::from_selection(&self.tables)
    }
}

fn parse_table(value: &str) -> Result<Table, String> {
    value.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    value
        .parse()
        .map_err(|_| format!("unknown log format {:?}, expected default, json, pretty or compact", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hris-migrate").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn migrate_orders_selected_tables() {
        let cli = parse(&["migrate", "--tables", "karyawan,divisions,leave-requests", "--dry-run"]);
        let Command::Migrate(args) = &cli.command else {
            panic!("expected migrate");
        };
        assert!(args.dry_run);
        assert!(!args.strict);
        assert_eq!(
            args.plan().tables(),
            &[Table::Divisions, Table::Employees, Table::LeaveRequests]
        );
    }

    #[test]
    fn batch_size_and_logging_become_overrides() {
        let cli = parse(&["--log-format", "json", "migrate", "--batch-size", "50", "--log-level", "debug"]);
        let overrides = cli.overrides();
        assert_eq!(overrides.batch_size, Some(50));
        assert_eq!(overrides.log_level.as_deref(), Some("debug"));
        assert_eq!(overrides.log_format, Some(Mode::Json));
    }

    #[test]
    fn reconcile_defaults() {
        let cli = parse(&["reconcile"]);
        let Command::Reconcile(args) = &cli.command else {
            panic!("expected reconcile");
        };
        assert_eq!(args.sample, 10);
        assert!(!cli.is_machine_output());
        assert_eq!(args.plan(), Plan::all());

        assert!(parse(&["reconcile", "--json"]).is_machine_output());
    }

    #[test]
    fn unknown_tables_are_rejected() {
        let err = Cli::try_parse_from(["hris-migrate", "migrate", "--tables", "cuti"]).unwrap_err();
        assert!(err.to_string().contains("leave_requests"));
        assert!(Cli::try_parse_from(["hris-migrate", "status", "--log-format", "xml"]).is_err());
    }
}

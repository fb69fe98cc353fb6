use anyhow::{bail, Result};
use clap::Parser;
use colored::*;
use dotenv::dotenv;
use std::time::Instant;
use tracing::info;

use hris_migrate::cli::{Cli, Command, MigrateArgs, ReconcileArgs};
use hris_migrate::config::Config;
use hris_migrate::database::connection::{connect_databases, Connections};
use hris_migrate::database::schema::{ensure_target_schema, missing_legacy_tables};
use hris_migrate::database::{mysql, postgres};
use hris_migrate::logging;
use hris_migrate::migrate::engine::{run_migration, MigrateOptions};
use hris_migrate::migrate::plan::Table;
use hris_migrate::reconcile::reconcile;
use hris_migrate::ui::{
    create_spinner, init_ui, print_migration_summary, print_reconcile_report, print_runs,
    print_table_counts,
};

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Instant::now();

    dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?.apply(cli.overrides())?;
    logging::init(&config.log_level, config.log_format)?;

    let quiet = cli.is_machine_output();
    if !quiet {
        init_ui();
    }

    let connection_spinner = create_spinner("Establishing database connections...");
    if quiet {
        connection_spinner.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
    let mut conns = connect_databases(&config, &connection_spinner).await?;
    connection_spinner.finish_with_message("✅ Databases connected!");

    let result = match &cli.command {
        Command::Prepare => prepare(&mut conns).await,
        Command::Migrate(args) => migrate(&mut conns, args, &config).await,
        Command::Reconcile(args) => reconcile_databases(&mut conns, args).await,
        Command::Status => status(&mut conns).await,
    };

    conns.disconnect().await?;
    result?;

    if !quiet {
        let duration = start_time.elapsed();
        println!(
            "\n{}",
            format!("⏱️ Total execution time: {:.2?}", duration).cyan()
        );
    }

    Ok(())
}

async fn prepare(conns: &mut Connections) -> Result<()> {
    let missing = missing_legacy_tables(&mut conns.mysql).await?;
    for table in &missing {
        println!(
            "{} legacy table {} not found, {} will stay empty",
            "⚠️".yellow(),
            table.legacy_name().yellow().bold(),
            table.target_name()
        );
    }

    let mut counts = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        let count = if missing.contains(&table) {
            None
        } else {
            Some(mysql::count(&mut conns.mysql, table).await?)
        };
        counts.push((table, table.legacy_name(), count));
    }
    print_table_counts("📋 LEGACY TABLES", &counts);

    let spinner = create_spinner("Creating target tables...");
    ensure_target_schema(&conns.postgres).await?;
    spinner.finish_with_message("✅ Target schema and migration ledger ready");
    info!(missing = missing.len(), "prepare finished");
    Ok(())
}

async fn migrate(conns: &mut Connections, args: &MigrateArgs, config: &Config) -> Result<()> {
    let options = MigrateOptions {
        dry_run: args.dry_run,
        batch_size: config.batch_size,
        ..Default::default()
    };

    let report = match run_migration(conns, &args.plan(), &options).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} {:#}", "❌ Migration failed:".red().bold(), e);
            return Err(e);
        }
    };
    print_migration_summary(&report);

    let failed = report.total_failed();
    if failed > 0 && args.strict {
        bail!("{} row(s) failed and --strict was given", failed);
    }
    if failed == 0 {
        println!(
            "{}",
            "🎉 Migration completed without failed rows! 🎉".green().bold()
        );
    }
    Ok(())
}

async fn reconcile_databases(conns: &mut Connections, args: &ReconcileArgs) -> Result<()> {
    let report = reconcile(conns, &args.plan(), args.sample).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_reconcile_report(&report);
    }
    Ok(())
}

async fn status(conns: &mut Connections) -> Result<()> {
    let runs = postgres::latest_runs(&conns.postgres).await?;
    print_runs(&runs);

    let mut counts = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        let count = if postgres::table_exists(&conns.postgres, table).await? {
            Some(postgres::count(&conns.postgres, table).await?)
        } else {
            None
        };
        counts.push((table, table.target_name(), count));
    }
    print_table_counts("📦 TARGET TABLES", &counts);
    Ok(())
}

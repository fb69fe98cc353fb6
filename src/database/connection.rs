use anyhow::{Context, Result};
use indicatif::ProgressBar;
use mysql_async::prelude::*;
use mysql_async::Pool;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error};

use crate::config::{describe_legacy, describe_target, Config};

/// Both ends of a migration: the legacy MySQL HRIS and the application's PostgreSQL.
pub struct Connections {
    pub mysql: mysql_async::Conn,
    pub postgres: Client,
    pool: Pool,
}

impl Connections {
    pub async fn disconnect(self) -> Result<()> {
        drop(self.mysql);
        self.pool.disconnect().await?;
        Ok(())
    }
}

pub async fn connect_databases(config: &Config, spinner: &ProgressBar) -> Result<Connections> {
    debug!(database = %describe_target(&config.target), "connecting to target database");
    let (postgres, connection) = config
        .target
        .connect(NoTls)
        .await
        .context("Failed to connect to PostgreSQL database")?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!(error = %e, "postgres connection closed");
        }
    });

    let row = postgres.query_one("SHOW server_version", &[]).await?;
    let version: String = row.get(0);
    spinner.set_message(format!("Connected to PostgreSQL: {}", version));

    debug!(database = %describe_legacy(&config.legacy), "connecting to legacy database");
    let pool = Pool::new(config.legacy.clone());
    let mut mysql = pool
        .get_conn()
        .await
        .context("Failed to connect to MySQL database")?;

    let version: Option<String> = mysql.query_first("SELECT VERSION()").await?;
    spinner.set_message(format!(
        "Connected to MySQL: {}",
        version.unwrap_or_else(|| "unknown".to_string())
    ));

    spinner.set_message("Connected to both databases successfully!".to_string());

    Ok(Connections {
        mysql,
        postgres,
        pool,
    })
}

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::info;

/// Connection options with a server-side `statement_timeout`, so a hung statement
/// fails instead of stalling the scrape cycle.
pub fn connect_options(database_url: &str, timeout: Duration) -> Result<PgConnectOptions> {
    let options = PgConnectOptions::from_str(database_url).context("Invalid DATABASE_URL")?;
    Ok(options.options([("statement_timeout", timeout.as_millis().to_string())]))
}

/// Creates a PostgreSQL connection pool and applies pending migrations.
pub async fn create_pool(database_url: &str, timeout: Duration) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(timeout)
        .connect_with(connect_options(database_url, timeout)?)
        .await?;

    info!("PostgreSQL connection pool established");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Database migrations applied");

    Ok(pool)
}

// Greenlight schema migrations

use anyhow::Context;
use tracing::info;

use greenlight_common::config::Config;
use greenlight_common::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let pool = db::connect(&config.database)
        .await
        .context("Database connection failed")?;

    info!("Applying migrations");
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("Failed to apply migrations")?;

    info!("Migrations applied");
    Ok(())
}

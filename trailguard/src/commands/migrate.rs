use anyhow::{Context, Result};
use tracing::*;
use trailguard_core::db::connect_to_db;

use crate::config::load_config;

pub(crate) async fn command(cli: &crate::Cli) -> Result<()> {
    let config = load_config(&cli.config)?;
    connect_to_db(&config)
        .await
        .context("Could not migrate the database")?;
    info!("Database is up to date");
    Ok(())
}

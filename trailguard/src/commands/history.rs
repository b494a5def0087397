use anyhow::Result;
use trailguard_core::Services;

use crate::config::load_config;

pub(crate) async fn command(cli: &crate::Cli, user_id: &str, limit: u64) -> Result<()> {
    let config = load_config(&cli.config)?;
    let services = Services::new(config).await?;

    let samples = services
        .locations
        .last_valid_locations(user_id, limit)
        .await?;
    if samples.is_empty() {
        println!("No valid locations for {user_id}");
        return Ok(());
    }
    for sample in samples {
        println!(
            "{}  {:>10.5} {:>11.5}",
            sample.created_at, sample.latitude, sample.longitude
        );
    }
    Ok(())
}

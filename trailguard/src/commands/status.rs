use anyhow::Result;
use chrono::Utc;
use trailguard_core::Services;

use crate::config::load_config;

pub(crate) async fn command(cli: &crate::Cli) -> Result<()> {
    let config = load_config(&cli.config)?;
    let services = Services::new(config).await?;
    let now = Utc::now();

    let status = services.abuse_protection.security_status(now).await?;
    println!("Banned addresses:      {}", status.banned_address_count);
    println!("Rejections (1h):       {}", status.rejections_last_hour);
    println!("Rejections (window):   {}", status.rejections_in_window);

    for ban in services.abuse_protection.list_banned(now).await? {
        println!(
            "  {} until {} ({} times)",
            ban.address, ban.banned_until, ban.banned_times
        );
    }
    Ok(())
}

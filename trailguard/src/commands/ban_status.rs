use anyhow::Result;
use chrono::Utc;
use trailguard_core::Services;

use crate::config::load_config;

pub(crate) async fn command(cli: &crate::Cli, address: &str) -> Result<()> {
    let config = load_config(&cli.config)?;
    let services = Services::new(config).await?;
    let now = Utc::now();

    let Some(record) = services.abuse_protection.ban_record(address).await? else {
        println!("{address}: never banned");
        return Ok(());
    };

    let state = if record.is_active(now) {
        let remaining = record.banned_until - now;
        format!("banned for another {} min", remaining.num_minutes())
    } else {
        "not banned".to_owned()
    };
    let rejections = services
        .abuse_protection
        .rejection_count(address, now)
        .await?;

    println!("{address}: {state}");
    println!("  banned until:   {}", record.banned_until);
    println!("  last banned at: {}", record.last_banned_at);
    println!("  ban length:     {} h", record.banned_length);
    println!("  times banned:   {}", record.banned_times);
    println!("  rejections:     {rejections} in the current window");
    println!("  reason:         {}", record.reason);
    Ok(())
}

mod commands;
mod config;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use logging::init_logging;

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, default_value = "/etc/trailguard.yaml", env = "TRAILGUARD_CONFIG")]
    config: PathBuf,
}

#[derive(clap::Subcommand)]
pub(crate) enum Commands {
    /// Validate config file
    Check,
    /// Create the database and apply pending migrations
    Migrate,
    /// Show the ban record of an address
    BanStatus { address: String },
    /// List the most recent valid locations of a user
    History {
        user_id: String,
        #[arg(long, short, default_value_t = 10)]
        limit: u64,
    },
    /// Show abuse protection counters
    Status,
    /// Print the JSON schema of the config file
    ConfigSchema,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();

    match &cli.command {
        Commands::Check => crate::commands::check::command(&cli).await,
        Commands::Migrate => crate::commands::migrate::command(&cli).await,
        Commands::BanStatus { address } => {
            crate::commands::ban_status::command(&cli, address).await
        }
        Commands::History { user_id, limit } => {
            crate::commands::history::command(&cli, user_id, *limit).await
        }
        Commands::Status => crate::commands::status::command(&cli).await,
        Commands::ConfigSchema => crate::commands::config_schema::command(),
    }
}

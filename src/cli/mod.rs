//! CLI commands for tinycoach using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::load_settings;
use crate::store::Store;

/// Tinycoach - Telegram accountability coach bot.
#[derive(Parser)]
#[command(name = "tinycoach")]
#[command(version = "0.1.0")]
#[command(about = "Telegram accountability coach bot", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

/// The two ingestion modes are mutually exclusive at deployment time:
/// a deployment runs either the webhook server or the polling loop.
#[derive(Subcommand)]
pub enum Command {
    /// Run the webhook server (push mode)
    Serve,

    /// Run the long-polling bot (pull mode)
    Poll,
}

impl Commands {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Serve => {
                let settings = load_settings()?;
                let store = Store::open(&settings.database_path)?;
                crate::web::run_server(&settings, store).await?;
            }
            Command::Poll => {
                let settings = load_settings()?;
                let store = Store::open(&settings.database_path)?;
                crate::telegram::run_polling_daemon(&settings, store).await?;
            }
        }
        Ok(())
    }
}

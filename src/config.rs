//! Environment configuration for tinycoach.

use std::path::PathBuf;

use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Runtime settings, read once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Telegram bot API token.
    pub bot_token: String,

    /// Shared secret echoed back by Telegram in the webhook header.
    /// Only required in webhook mode; the server refuses to start without it.
    pub webhook_secret: Option<String>,

    /// Path of the SQLite database file.
    pub database_path: PathBuf,

    /// Listen address for the webhook server.
    pub host: String,
    pub port: u16,
}

/// Load settings from the process environment (and `.env`, if present).
///
/// Fails fast on missing required values so neither transport starts with a
/// half-configured process.
pub fn load_settings() -> Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings {
        bot_token: require_env("TELEGRAM_BOT_TOKEN")?,
        webhook_secret: optional_env("TELEGRAM_WEBHOOK_SECRET"),
        database_path: PathBuf::from(require_env("DATABASE_PATH")?),
        host: optional_env("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
        port: match optional_env("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("PORT must be a number, got '{}'", raw)))?,
            None => 8080,
        },
    };

    tracing::debug!("Loaded settings (database: {})", settings.database_path.display());
    Ok(settings)
}

fn require_env(key: &str) -> Result<String> {
    optional_env(key).ok_or_else(|| Error::Config(format!("{} must be set", key)))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

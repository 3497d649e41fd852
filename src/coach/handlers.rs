//! Command handlers. Each produces exactly one reply string; store failures
//! never escape past [`dispatch`].

use crate::error::Error;
use crate::store::{require_user, resolve_user, Store};

use super::command::Command;

pub const WELCOME: &str = "👋 Hi! I’m your accountability coach.\nUse /log <what you ate/did> (e.g., /log 2 eggs + dal).\nTry /status to see your count.";
pub const LOG_USAGE: &str = "Usage: /log 2 eggs + dal + rice";
pub const START_FIRST: &str = "Send /start first.";
pub const FALLBACK: &str = "I understand: /start, /ping, /log, /status";
pub const TROUBLE: &str = "⚠️ Something went wrong. Please try again.";

/// Route one inbound message to its handler and return the reply text.
///
/// Never fails: validation problems get a usage hint, unknown input gets
/// the fallback, and store errors are logged and flattened into a generic
/// failure reply so nothing propagates back to the transport.
pub fn dispatch(store: &Store, chat_id: i64, text: &str) -> String {
    let reply = match Command::parse(text) {
        Some(Command::Start) => handle_start(store, chat_id),
        Some(Command::Ping) => Ok("pong".to_string()),
        Some(Command::Log(argument)) => handle_log(store, chat_id, &argument),
        Some(Command::Status) => handle_status(store, chat_id),
        None => Ok(FALLBACK.to_string()),
    };

    match reply {
        Ok(text) => text,
        Err(Error::Validation(_)) => LOG_USAGE.to_string(),
        Err(e) => {
            tracing::error!("Command handling failed for chat {}: {}", chat_id, e);
            TROUBLE.to_string()
        }
    }
}

fn handle_start(store: &Store, chat_id: i64) -> Result<String, Error> {
    store.with_tx(|repo| resolve_user(repo, chat_id))?;
    Ok(WELCOME.to_string())
}

fn handle_log(store: &Store, chat_id: i64, argument: &str) -> Result<String, Error> {
    let text = argument.trim();
    if text.is_empty() {
        // Usage hint; nothing is written, not even the user row.
        return Ok(LOG_USAGE.to_string());
    }
    store.with_tx(|repo| {
        let user = resolve_user(repo, chat_id)?;
        repo.append_log_entry(&user.id, text)
    })?;
    Ok(format!("✅ Saved log: {}", text))
}

fn handle_status(store: &Store, chat_id: i64) -> Result<String, Error> {
    store.with_tx(|repo| match require_user(repo, chat_id) {
        Ok(user) => {
            let count = repo.count_log_entries(&user.id)?;
            Ok(format!("📊 You’ve logged {} entries.", count))
        }
        Err(Error::NotFound(_)) => Ok(START_FIRST.to_string()),
        Err(e) => Err(e),
    })
}

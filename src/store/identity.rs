//! Identity resolution: one durable user per Telegram chat id.

use crate::error::Error;

use super::repository::{Repo, User};

/// Find the user for a chat id, creating one on first contact.
///
/// Safe under concurrent first contact: if the insert loses the race against
/// another update for the same chat, the uniqueness conflict is swallowed
/// and the winning row is returned instead.
pub fn resolve_user(repo: &Repo<'_>, chat_id: i64) -> Result<User, Error> {
    if let Some(user) = repo.find_user_by_chat_id(chat_id)? {
        return Ok(user);
    }
    match repo.create_user(chat_id) {
        Ok(user) => {
            tracing::info!("Created user {} for chat {}", user.id, chat_id);
            Ok(user)
        }
        Err(Error::Conflict(_)) => repo.find_user_by_chat_id(chat_id)?.ok_or_else(|| {
            Error::Store(format!("user for chat {} missing after conflict", chat_id))
        }),
        Err(e) => Err(e),
    }
}

/// Strict lookup for commands that must not create a user as a side effect.
pub fn require_user(repo: &Repo<'_>, chat_id: i64) -> Result<User, Error> {
    repo.find_user_by_chat_id(chat_id)?
        .ok_or_else(|| Error::NotFound(format!("no user for chat {}", chat_id)))
}

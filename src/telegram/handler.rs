//! Telegram message handling shared by both ingestion modes.
//!
//! The webhook server and the polling loop both funnel into
//! [`process_message`], so routing and persistence logic exist once.

use teloxide::prelude::*;
use teloxide::types::{Message, Update, UpdateKind};
use teloxide::RequestError;

use crate::store::Store;

/// Pull a chat id and message text out of a raw update.
///
/// Non-message updates and messages without text (stickers, photos, joins)
/// are not commands and yield `None`.
pub fn extract_text_message(update: &Update) -> Option<(ChatId, String)> {
    match &update.kind {
        UpdateKind::Message(msg) => msg.text().map(|text| (msg.chat.id, text.to_string())),
        _ => None,
    }
}

/// Dispatch one message and send the reply back to the chat.
///
/// Whitespace-only text is a no-op here, in the one place both gateways
/// share, so the two transports make the identical drop decision.
///
/// A failed send is logged and swallowed: the update has already been
/// consumed and committed, and the platform may redeliver on its own terms.
pub async fn process_message(bot: &Bot, store: &Store, chat_id: ChatId, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    let reply = crate::coach::dispatch(store, chat_id.0, text);
    if let Err(e) = bot.send_message(chat_id, reply).await {
        tracing::warn!("Failed to send reply to chat {}: {}", chat_id.0, e);
    }
}

/// Handle one incoming message from the polling loop.
pub async fn handle_message(bot: Bot, msg: Message, store: Store) -> Result<(), RequestError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    process_message(&bot, &store, msg.chat.id, text).await;
    Ok(())
}

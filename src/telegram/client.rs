//! Telegram bot client - long-polling mode.

use teloxide::prelude::*;

use crate::config::Settings;
use crate::error::Error;
use crate::store::Store;

use super::handler::handle_message;

/// Run the bot in long-polling mode (pull ingestion).
///
/// Updates are fetched in batches and processed sequentially in arrival
/// order; the dispatcher advances the update offset so each update is
/// consumed at most once from the fetch source.
pub async fn run_polling_daemon(settings: &Settings, store: Store) -> Result<(), Error> {
    tracing::info!("Starting Telegram polling bot...");

    let bot = Bot::new(settings.bot_token.clone());

    if let Err(e) = bot
        .set_my_commands(vec![
            teloxide::types::BotCommand::new("start", "Meet your accountability coach"),
            teloxide::types::BotCommand::new("ping", "Check that the bot is alive"),
            teloxide::types::BotCommand::new("log", "Record what you ate or did"),
            teloxide::types::BotCommand::new("status", "Show how many entries you've logged"),
        ])
        .await
    {
        tracing::warn!("Failed to set commands: {}", e);
    }

    tracing::info!("Telegram bot commands set");

    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let store = store.clone();
        async move { handle_message(bot, msg, store).await }
    })
    .await;

    Ok(())
}

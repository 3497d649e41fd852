//! Webhook server using Axum.

use std::net::SocketAddr;

use teloxide::Bot;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::error::Error;
use crate::store::Store;

use super::router::{create_app_router, AppState};

/// Run the webhook server (push ingestion).
pub async fn run_server(settings: &Settings, store: Store) -> Result<(), Error> {
    let webhook_secret = settings.webhook_secret.clone().ok_or_else(|| {
        Error::Config("TELEGRAM_WEBHOOK_SECRET must be set in webhook mode".to_string())
    })?;

    let bot = Bot::new(settings.bot_token.clone());
    let app = create_app_router(AppState {
        bot,
        store,
        webhook_secret,
    })
    .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .map_err(|e| Error::Config(format!("Invalid listen address: {}", e)))?;

    tracing::info!("Starting webhook server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use tracing::{debug, info, warn};

use mama_match::bot::{command_menu, schema};
use mama_match::config::BotConfig;
use mama_match::db::{init_database_schema, list_message_templates};
use mama_match::dialogue::BotDialogueState;
use mama_match::health::spawn_health_server;
use mama_match::localization::init_localization_with;
use mama_match::logging::init_tracing;
use mama_match::session_store::SessionStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();
    info!("Starting Mama Match Telegram Bot");

    let config = BotConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    init_database_schema(&pool).await?;

    // Stored templates override the bundled locale files
    let templates = list_message_templates(&pool).await?;
    init_localization_with(&config.locales_dir, &templates)?;
    info!(templates = templates.len(), locales_dir = %config.locales_dir.display(), "Localization initialized");

    let sessions = SessionStore::<BotDialogueState>::new(config.session_ttl);
    sessions.spawn_sweeper(config.session_sweep_interval);

    spawn_health_server(config.health_addr).await?;

    let bot = Bot::new(&config.bot_token);
    if let Err(e) = bot.set_my_commands(command_menu()).await {
        warn!(error = %e, "Failed to register command menu");
    }

    info!("Bot initialized, starting dispatcher");

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![Arc::new(pool), sessions])
        .default_handler(|update| async move {
            debug!(update = ?update, "Unhandled update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build();

    match config.webhook_url.clone() {
        Some(url) => {
            info!(url = %url, addr = %config.webhook_listen_addr, "Receiving updates through webhook");
            let listener = webhooks::axum(bot, webhooks::Options::new(config.webhook_listen_addr, url))
                .await
                .context("Failed to register webhook")?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
        None => {
            info!("Receiving updates through long polling");
            dispatcher.dispatch().await;
        }
    }

    info!("Bot stopped");
    Ok(())
}

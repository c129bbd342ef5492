//! Polling runner: converts teloxide updates to core updates and hands them to the
//! [`SessionDispatcher`], which serializes them per chat.

use anyhow::Result;
use session::{AccountContext, Conversation, SessionDispatcher};
use std::sync::Arc;
use storage::{InMemoryUserStore, UserRepository, UserStore};
use tbb_core::ToCoreUpdate;
use teloxide::prelude::*;
use teloxide::types::Update;
use tracing::{debug, error, info, instrument};

use crate::adapters::TelegramUpdateWrapper;
use crate::config::BotConfig;

/// Creates the teloxide Bot, pointing it at `telegram_api_url` when set.
pub fn build_bot(config: &BotConfig) -> teloxide::Bot {
    let bot = teloxide::Bot::new(config.bot_token.clone());
    match config.telegram_api_url {
        Some(ref url_str) => match reqwest::Url::parse(url_str) {
            Ok(url) => bot.set_api_url(url),
            Err(e) => {
                error!(error = %e, url = %url_str, "Invalid TELEGRAM_API_URL, using default");
                bot
            }
        },
        None => bot,
    }
}

/// Opens the user store selected by `database_url`.
#[instrument(skip(config), fields(database_url = %config.database_url))]
pub async fn create_user_store(config: &BotConfig) -> Result<Arc<dyn UserStore>> {
    if config.use_memory_store() {
        info!("Using in-memory user store");
        return Ok(Arc::new(InMemoryUserStore::new()));
    }

    let repo = UserRepository::new(&config.database_url)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to initialize user storage");
            anyhow::anyhow!("Failed to initialize user storage: {}", e)
        })?;
    Ok(Arc::new(repo))
}

/// Registers the command menu, then long-polls Telegram until Ctrl-C.
#[instrument(skip(bot, account))]
pub async fn run_polling<S: Conversation>(
    bot: teloxide::Bot,
    account: Arc<AccountContext<S>>,
) -> Result<()> {
    if let Err(e) = account.register_command_menu().await {
        error!(error = %e, "Failed to register bot commands");
    }

    let sessions = SessionDispatcher::new(account);
    let handler = dptree::entry().endpoint(move |update: Update| {
        let sessions = sessions.clone();
        async move {
            let core = TelegramUpdateWrapper(&update).to_core();
            debug!(update_id = core.id, kind = core.kind_name(), "Received update");
            sessions.dispatch(core);
            respond(())
        }
    });

    info!("Bot started, polling for updates");

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");
    Ok(())
}

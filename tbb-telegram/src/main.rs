//! tbb CLI: runs the example Telegram bot. Config from env and optional CLI args.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use session::builtin::{
    BuiltinState, DisableCommand, EnableCommand, HelpCommand, TimezoneCommand,
};
use session::{AccountContext, Command, Continuation, SessionContext, UpdateHandler};
use tbb_core::{init_tracing, Message};
use tbb_telegram::{
    build_bot, create_user_store, load_config, run_polling, Cli, Commands, TelegramBotAdapter,
};
use tracing::{error, info};

/// Echoes text messages; answers a location with its resolved timezone.
struct EchoHandler;

#[async_trait]
impl UpdateHandler<BuiltinState> for EchoHandler {
    async fn handle_message(
        &mut self,
        ctx: &SessionContext,
        message: &Message,
    ) -> Continuation<BuiltinState> {
        if let Some(location) = message.location {
            match ctx.timezone_info(location.latitude, location.longitude) {
                Ok(tz) => {
                    let json = serde_json::to_string_pretty(&tz).unwrap_or_default();
                    ctx.reply(&json).await;
                }
                Err(e) => {
                    error!(chat_id = ctx.chat_id(), error = %e, "Error getting timezone info");
                    ctx.reply("Sorry, I could not resolve a time zone for that location.")
                        .await;
                }
            }
        } else if let Some(text) = message.text() {
            ctx.reply(text).await;
        }
        None
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => {
            let config = load_config(token)?;
            init_tracing(&config.log_file, &config.log_level)?;

            info!(
                database_url = %config.database_url,
                allowed_chats = config.allowed_chat_ids.len(),
                "Initializing bot"
            );

            let store = create_user_store(&config).await?;
            let bot = build_bot(&config);

            let account = AccountContext::<BuiltinState>::builder()
                .settings(config.session_settings())
                .bot(Arc::new(TelegramBotAdapter::new(bot.clone())))
                .store(store)
                .command(Command::new("/start").handler(EnableCommand))
                .command(
                    Command::new("/enable")
                        .description("Enables the notifications")
                        .handler(EnableCommand),
                )
                .command(
                    Command::new("/disable")
                        .description("Disables the notifications")
                        .handler(DisableCommand),
                )
                .command(
                    Command::new("/timezone")
                        .description("Sets your time zone from a location")
                        .handler(TimezoneCommand),
                )
                .command(
                    Command::new("/help")
                        .description("Shows the help message")
                        .handler(HelpCommand::default()),
                )
                .handler_factory(|| Box::new(EchoHandler) as Box<dyn UpdateHandler<BuiltinState>>)
                .build()?;

            run_polling(bot, Arc::new(account)).await
        }
    }
}

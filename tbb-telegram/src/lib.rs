//! # tbb-telegram
//!
//! Telegram transport for tbb: teloxide adapters, [`tbb_core::Bot`] implementation, env config,
//! the polling runner and the `tbb` CLI. Session logic lives in the `session` crate.

pub mod cli;
mod adapters;
mod bot_adapter;
mod config;
mod runner;

pub use adapters::{TelegramUpdateWrapper, TelegramUserWrapper};
pub use bot_adapter::TelegramBotAdapter;
pub use cli::{load_config, Cli, Commands};
pub use config::{BotConfig, MEMORY_STORE_URL};
pub use runner::{build_bot, create_user_store, run_polling};

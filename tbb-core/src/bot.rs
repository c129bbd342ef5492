//! Platform client abstraction.
//!
//! [`Bot`] is transport-agnostic; tbb-telegram implements it via teloxide and tests substitute a recording mock.

use crate::error::Result;
use crate::types::{BotCommand, FileInfo, InlineKeyboard, UserProfilePhotos};
use async_trait::async_trait;

/// Calls the session engine and its handlers make against the bot platform.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a text message, optionally with an inline keyboard. Returns the new message id.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<i32>;

    /// Replaces text and keyboard of an already-sent message.
    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()>;

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()>;

    /// Sends a map point. Returns the new message id.
    async fn send_location(&self, chat_id: i64, latitude: f64, longitude: f64) -> Result<i32>;

    /// One page of the user's profile photos, newest first; sizes within a photo are ordered largest-last.
    async fn get_user_profile_photos(
        &self,
        user_id: i64,
        offset: u32,
        limit: u8,
    ) -> Result<UserProfilePhotos>;

    async fn get_file(&self, file_id: &str) -> Result<FileInfo>;

    /// Downloads the content behind a [`FileInfo::path`].
    async fn download_file(&self, path: &str) -> Result<Vec<u8>>;

    /// Replaces the bot's command menu.
    async fn set_my_commands(&self, commands: Vec<BotCommand>) -> Result<()>;

    /// Clears the bot's command menu.
    async fn delete_my_commands(&self) -> Result<()>;
}

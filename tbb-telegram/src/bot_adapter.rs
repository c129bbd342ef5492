//! Wraps teloxide::Bot and implements [`tbb_core::Bot`]. Production code talks to Telegram; tests substitute another Bot impl.

use async_trait::async_trait;
use tbb_core::{
    Bot as CoreBot, BotCommand, FileInfo, InlineKeyboard, PhotoSize, Result, TbbError,
    UserProfilePhotos,
};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, FileId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, UserId,
};

/// Thin wrapper around teloxide::Bot that implements tbb-core's Bot trait.
#[derive(Clone)]
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

fn bot_error(e: impl std::fmt::Display) -> TbbError {
    TbbError::Bot(e.to_string())
}

fn markup(keyboard: InlineKeyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.into_iter().map(|row| {
        row.into_iter()
            .map(|b| InlineKeyboardButton::callback(b.text, b.callback_data))
            .collect::<Vec<_>>()
    }))
}

impl TelegramBotAdapter {
    /// Creates an adapter from an existing teloxide Bot.
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<i32> {
        let mut request = self.bot.send_message(ChatId(chat_id), text.to_string());
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(markup(keyboard));
        }
        let sent = request.await.map_err(bot_error)?;
        Ok(sent.id.0)
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()> {
        let mut request = self
            .bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text.to_string());
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(markup(keyboard));
        }
        request.await.map_err(bot_error)?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
            .map_err(bot_error)?;
        Ok(())
    }

    async fn send_location(&self, chat_id: i64, latitude: f64, longitude: f64) -> Result<i32> {
        let sent = self
            .bot
            .send_location(ChatId(chat_id), latitude, longitude)
            .await
            .map_err(bot_error)?;
        Ok(sent.id.0)
    }

    async fn get_user_profile_photos(
        &self,
        user_id: i64,
        offset: u32,
        limit: u8,
    ) -> Result<UserProfilePhotos> {
        let photos = self
            .bot
            .get_user_profile_photos(UserId(user_id as u64))
            .offset(offset)
            .limit(limit)
            .await
            .map_err(bot_error)?;

        Ok(UserProfilePhotos {
            total_count: photos.total_count,
            photos: photos
                .photos
                .into_iter()
                .map(|sizes| {
                    sizes
                        .into_iter()
                        .map(|p| PhotoSize {
                            file_id: p.file.id.to_string(),
                            file_unique_id: p.file.unique_id.to_string(),
                            width: p.width,
                            height: p.height,
                            file_size: Some(p.file.size),
                        })
                        .collect()
                })
                .collect(),
        })
    }

    async fn get_file(&self, file_id: &str) -> Result<FileInfo> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_string()))
            .await
            .map_err(bot_error)?;
        Ok(FileInfo {
            file_id: file.meta.id.to_string(),
            file_unique_id: file.meta.unique_id.to_string(),
            file_size: file.meta.size,
            path: file.path,
        })
    }

    async fn download_file(&self, path: &str) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.bot
            .download_file(path, &mut data)
            .await
            .map_err(bot_error)?;
        Ok(data)
    }

    async fn set_my_commands(&self, commands: Vec<BotCommand>) -> Result<()> {
        let commands = commands
            .into_iter()
            .map(|c| teloxide::types::BotCommand::new(c.command, c.description));
        self.bot.set_my_commands(commands).await.map_err(bot_error)?;
        Ok(())
    }

    async fn delete_my_commands(&self) -> Result<()> {
        self.bot.delete_my_commands().await.map_err(bot_error)?;
        Ok(())
    }
}

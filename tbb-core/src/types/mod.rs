//! Core types: chats, users, messages, updates, keyboards and files.

mod chat;
mod file;
mod keyboard;
mod message;
mod update;
mod user;

pub use chat::{Chat, ChatKind};
pub use file::{BotCommand, FileInfo, PhotoSize, UserProfilePhotos};
pub use keyboard::{InlineKeyboard, InlineKeyboardButton};
pub use message::{Location, Message};
pub use update::{
    CallbackQuery, ChatJoinRequest, ChatMember, ChatMemberStatus, ChatMemberUpdated,
    ChosenInlineResult, InlineQuery, PreCheckoutQuery, ShippingQuery, Update, UpdateKind,
};
pub use user::{ToCoreUser, User};

/// Converts a transport-specific update type to core [`Update`].
pub trait ToCoreUpdate: Send + Sync {
    fn to_core(&self) -> Update;
}

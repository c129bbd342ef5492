//! # tbb-core
//!
//! Core types and traits for tbb: the inbound [`Update`] model, the platform client [`Bot`],
//! the [`TimezoneResolver`] contract, error types and tracing initialization.
//! Transport-agnostic; used by session and tbb-telegram.

pub mod bot;
pub mod error;
pub mod logger;
pub mod timezone;
pub mod types;

pub use bot::Bot;
pub use error::{HandlerError, Result, TbbError};
pub use logger::init_tracing;
pub use timezone::{LookupTimezoneResolver, NauticalTimezoneResolver, TimezoneInfo, TimezoneResolver};
pub use types::{
    BotCommand, CallbackQuery, Chat, ChatJoinRequest, ChatKind, ChatMember, ChatMemberStatus,
    ChatMemberUpdated, ChosenInlineResult, FileInfo, InlineKeyboard, InlineKeyboardButton,
    InlineQuery, Location, Message, PhotoSize, PreCheckoutQuery, ShippingQuery, ToCoreUpdate,
    ToCoreUser, Update, UpdateKind, User, UserProfilePhotos,
};

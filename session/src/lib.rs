//! # session
//!
//! Per-chat session engine. An [`AccountContext`] holds what every chat shares (settings, bot
//! client, user store, commands, handler factory). The [`SessionDispatcher`] creates a
//! [`Session`] on the first update of a chat and routes later updates to it.
//!
//! Each update runs through a fixed pipeline: access check, background profile refresh,
//! command match, bot membership change, then either the initial [`UpdateHandler`] method or the
//! [`Conversation`] state in flight. Idle sessions evict themselves.

pub mod account;
pub mod builtin;
pub mod command;
pub mod context;
pub mod conversation;
pub mod files;
pub mod handler;
pub mod profile;
pub mod registry;
pub mod session;
pub mod timer;

pub use account::{AccountBuilder, AccountContext, AccountServices, SessionSettings};
pub use command::{parse_command_line, Command, CommandHandler, CommandRegistry, COMMAND_PREFIX};
pub use context::SessionContext;
pub use conversation::{Continuation, Conversation};
pub use files::{download_file, DownloadedFile};
pub use handler::{apply_membership_change, DefaultUpdateHandler, HandlerFactory, UpdateHandler};
pub use registry::{SessionDispatcher, SessionRegistry};
pub use session::Session;
pub use timer::InactivityTimer;

//! Built-in commands and the conversation states they use.
//!
//! Command handlers are generic over the bot's state type, so a bot can embed
//! [`BuiltinState`] in its own state enum through `From<BuiltinState>`.

mod disable;
mod enable;
mod help;
mod state;
mod timezone;

pub use disable::DisableCommand;
pub use enable::EnableCommand;
pub use help::HelpCommand;
pub use state::{
    BuiltinState, ANSWER_KEEP, ANSWER_UPDATE, MSG_INVALID_LOCATION, MSG_SEND_LOCATION,
};
pub use timezone::TimezoneCommand;

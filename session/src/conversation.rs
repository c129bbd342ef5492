//! Conversation states.
//!
//! A session's conversation is a value of the bot's state type `S`. `None` means no multi-step
//! exchange is in flight; `Some(state)` receives the next update through [`Conversation::resume`].

use async_trait::async_trait;
use tbb_core::Update;

use crate::context::SessionContext;

/// What runs on the next update for a chat.
pub type Continuation<S> = Option<S>;

/// Named conversation states of a bot.
///
/// `resume` consumes the current state and returns the next one. Returning `Some(self)` keeps
/// waiting (e.g. until a valid location arrives); returning `None` ends the exchange.
#[async_trait]
pub trait Conversation: Send + Sync + Sized + 'static {
    async fn resume(self, ctx: &SessionContext, update: &Update) -> Continuation<Self>;
}

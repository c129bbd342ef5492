use async_trait::async_trait;

use super::state::BuiltinState;
use crate::command::{Command, CommandHandler};
use crate::context::SessionContext;
use crate::conversation::{Continuation, Conversation};

/// Asks for a location and stores the resolved timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimezoneCommand;

#[async_trait]
impl<S> CommandHandler<S> for TimezoneCommand
where
    S: Conversation + From<BuiltinState>,
{
    async fn handle(&self, ctx: &SessionContext, _command: &Command<S>) -> Continuation<S> {
        let name = ctx.display_name().await;
        ctx.reply(&format!(
            "Hi {}, please send me a location in order to set the correct time zone for you.",
            name
        ))
        .await;
        Some(BuiltinState::AwaitLocation { enabling: false }.into())
    }
}

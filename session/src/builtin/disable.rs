use async_trait::async_trait;

use crate::command::{Command, CommandHandler};
use crate::context::SessionContext;
use crate::conversation::{Continuation, Conversation};

/// Notifies the user and disables them.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisableCommand;

#[async_trait]
impl<S: Conversation> CommandHandler<S> for DisableCommand {
    async fn handle(&self, ctx: &SessionContext, _command: &Command<S>) -> Continuation<S> {
        ctx.reply("You won't receive any updates anymore. Send /enable to enable updates again.")
            .await;
        ctx.disable_user().await;
        None
    }
}

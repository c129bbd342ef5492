use async_trait::async_trait;
use tbb_core::InlineKeyboardButton;
use tracing::error;

use super::state::{BuiltinState, ANSWER_KEEP, ANSWER_UPDATE};
use crate::command::{Command, CommandHandler};
use crate::context::SessionContext;
use crate::conversation::{Continuation, Conversation};

/// Enables the user, then asks whether to keep or update the stored location.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnableCommand;

#[async_trait]
impl<S> CommandHandler<S> for EnableCommand
where
    S: Conversation + From<BuiltinState>,
{
    async fn handle(&self, ctx: &SessionContext, _command: &Command<S>) -> Continuation<S> {
        ctx.enable_user().await;

        let (zone_name, latitude, longitude) = {
            let user = ctx.lock_user().await;
            (
                user.info.zone_name.clone(),
                user.info.latitude,
                user.info.longitude,
            )
        };

        let sent = if zone_name.is_empty() {
            let keyboard = vec![vec![
                InlineKeyboardButton::callback("Yes", ANSWER_UPDATE),
                InlineKeyboardButton::callback("No", ""),
            ]];
            ctx.send_message_with_keyboard(
                "I don't have your current time zone for messaging. Do you want to send me your current location, so that I can figure out your current timezone settings?",
                keyboard,
            )
            .await
        } else {
            if let Err(e) = ctx.send_location(latitude, longitude).await {
                error!(chat_id = ctx.chat_id(), error = %e, "Failed to send stored location");
            }
            let keyboard = vec![vec![
                InlineKeyboardButton::callback("Yes", ANSWER_KEEP),
                InlineKeyboardButton::callback("No", ANSWER_UPDATE),
            ]];
            ctx.send_message_with_keyboard("Is this location still correct?", keyboard)
                .await
        };
        if let Err(e) = sent {
            error!(chat_id = ctx.chat_id(), error = %e, "Failed to send location question");
        }

        Some(BuiltinState::AwaitLocationAnswer.into())
    }
}

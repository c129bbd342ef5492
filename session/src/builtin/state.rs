use async_trait::async_trait;
use tbb_core::{Update, UpdateKind};
use tracing::{error, info};

use crate::context::SessionContext;
use crate::conversation::{Continuation, Conversation};

pub const ANSWER_UPDATE: &str = "update";
pub const ANSWER_KEEP: &str = "keep";

pub const MSG_SEND_LOCATION: &str = "Ok, then please send me a valid location point";
pub const MSG_INVALID_LOCATION: &str = "Please send a valid location point";

/// States of the built-in location dialogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinState {
    /// Waiting for the keep/update answer after enabling.
    AwaitLocationAnswer,
    /// Waiting for a location message. `enabling` selects the confirmation text.
    AwaitLocation { enabling: bool },
}

#[async_trait]
impl Conversation for BuiltinState {
    async fn resume(self, ctx: &SessionContext, update: &Update) -> Continuation<Self> {
        match self {
            BuiltinState::AwaitLocationAnswer => await_location_answer(ctx, update).await,
            BuiltinState::AwaitLocation { enabling } => {
                await_location(ctx, update, enabling).await
            }
        }
    }
}

/// Handles the keep/update answer. Anything but a callback query keeps waiting.
pub(crate) async fn await_location_answer(
    ctx: &SessionContext,
    update: &Update,
) -> Continuation<BuiltinState> {
    let UpdateKind::CallbackQuery(query) = &update.kind else {
        return Some(BuiltinState::AwaitLocationAnswer);
    };
    let answer = query.data.as_deref().unwrap_or_default();
    info!(chat_id = ctx.chat_id(), answer, "Location answer received");

    match answer {
        ANSWER_UPDATE => {
            ctx.reply(MSG_SEND_LOCATION).await;
            Some(BuiltinState::AwaitLocation { enabling: true })
        }
        ANSWER_KEEP => {
            let zone = ctx.lock_user().await.info.zone_name.clone();
            ctx.reply(&format!(
                "Ok, then I'll keep your current time zone ({})",
                zone
            ))
            .await;
            None
        }
        _ => {
            ctx.reply("Ok, then I will use UTC as your time zone. Your account is now enabled.")
                .await;
            None
        }
    }
}

/// Waits for a location message, then resolves and stores the user's timezone.
pub(crate) async fn await_location(
    ctx: &SessionContext,
    update: &Update,
    enabling: bool,
) -> Continuation<BuiltinState> {
    let location = match &update.kind {
        UpdateKind::Message(m) => m.location,
        _ => None,
    };
    let Some(location) = location else {
        ctx.reply(MSG_INVALID_LOCATION).await;
        return Some(BuiltinState::AwaitLocation { enabling });
    };

    let mut text = format!(
        "I received your location update: Latitude = {:.6} | Longitude = {:.6}.",
        location.latitude, location.longitude
    );
    if enabling {
        text.push_str("\nYour notifications are now enabled.");
    }
    ctx.reply(&text).await;

    match ctx.timezone_info(location.latitude, location.longitude) {
        Ok(tz) => {
            info!(chat_id = ctx.chat_id(), zone = %tz.zone_name, "Timezone updated");
            ctx.set_timezone(&tz).await;
        }
        Err(e) => error!(chat_id = ctx.chat_id(), error = %e, "Error getting timezone info"),
    }
    None
}

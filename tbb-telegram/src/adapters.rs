//! Adapters from Telegram (teloxide) types to tbb_core types.
//! Updates go through their Bot API JSON form so every update kind maps onto [`UpdateKind`].

use tbb_core::{ToCoreUpdate, ToCoreUser, Update, UpdateKind, User};
use tracing::error;

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> ToCoreUser for TelegramUserWrapper<'a> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            is_bot: self.0.is_bot,
            first_name: self.0.first_name.clone(),
            last_name: self.0.last_name.clone(),
            username: self.0.username.clone(),
            language_code: self.0.language_code.clone(),
            is_premium: self.0.is_premium,
            added_to_attachment_menu: self.0.added_to_attachment_menu,
            ..Default::default()
        }
    }
}

/// Wraps a teloxide Update for conversion to core [`Update`].
pub struct TelegramUpdateWrapper<'a>(pub &'a teloxide::types::Update);

impl<'a> ToCoreUpdate for TelegramUpdateWrapper<'a> {
    fn to_core(&self) -> Update {
        match serde_json::to_value(self.0) {
            Ok(value) => Update::from_bot_api(value),
            Err(e) => {
                error!(update_id = self.0.id.0, error = %e, "Failed to serialize Telegram update");
                Update::new(i64::from(self.0.id.0), UpdateKind::Unknown(serde_json::Value::Null))
            }
        }
    }
}

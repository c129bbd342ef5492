//! Per-session handle given to command handlers, update handlers and conversation states.

use std::sync::Arc;

use storage::{MemberStatus, UserRecord, UserStore};
use tbb_core::{
    Bot, CallbackQuery, HandlerError, InlineKeyboard, Result, TbbError, TimezoneInfo,
    TimezoneResolver,
};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::account::{AccountServices, SessionSettings};

/// Chat identity, the locked user record and the account services.
///
/// Cloning is cheap; clones share the same user record. Every read or write of the record goes
/// through its mutex, which the background profile refresh also takes.
#[derive(Clone)]
pub struct SessionContext {
    chat_id: i64,
    user: Arc<Mutex<UserRecord>>,
    services: Arc<AccountServices>,
}

impl SessionContext {
    pub fn new(chat_id: i64, user: UserRecord, services: Arc<AccountServices>) -> Self {
        Self {
            chat_id,
            user: Arc::new(Mutex::new(user)),
            services,
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.services.settings
    }

    pub fn bot(&self) -> &dyn Bot {
        self.services.bot.as_ref()
    }

    pub fn store(&self) -> &dyn UserStore {
        self.services.store.as_ref()
    }

    pub fn timezones(&self) -> &dyn TimezoneResolver {
        self.services.timezones.as_ref()
    }

    /// Locks the user record. Do not hold the guard across platform calls.
    pub async fn lock_user(&self) -> MutexGuard<'_, UserRecord> {
        self.user.lock().await
    }

    /// Copy of the current user record.
    pub async fn user(&self) -> UserRecord {
        self.user.lock().await.clone()
    }

    pub async fn is_user_active(&self) -> bool {
        self.user.lock().await.info.is_active
    }

    /// First name, falling back to the handle.
    pub async fn display_name(&self) -> String {
        let user = self.user.lock().await;
        if user.first_name.is_empty() {
            user.username.clone()
        } else {
            user.first_name.clone()
        }
    }

    /// Marks the user active member and persists the record.
    pub async fn enable_user(&self) {
        self.set_membership(true, MemberStatus::Member).await;
    }

    /// Marks the user inactive and kicked and persists the record.
    pub async fn disable_user(&self) {
        self.set_membership(false, MemberStatus::Kicked).await;
    }

    async fn set_membership(&self, is_active: bool, status: MemberStatus) {
        let mut user = self.user.lock().await;
        user.info.is_active = is_active;
        user.info.status = status;
        info!(
            chat_id = self.chat_id,
            is_active,
            status = status.as_str(),
            "User membership changed"
        );
        self.persist(&user).await;
    }

    /// Persists the current record. Failures are logged, not retried.
    pub async fn save_user(&self) {
        let user = self.user.lock().await;
        self.persist(&user).await;
    }

    async fn persist(&self, user: &UserRecord) {
        if let Err(e) = self.services.store.save(user).await {
            error!(chat_id = self.chat_id, error = %e, "Failed to save user");
        }
    }

    pub async fn send_message(&self, text: &str) -> Result<i32> {
        self.services.bot.send_message(self.chat_id, text, None).await
    }

    pub async fn send_message_with_keyboard(
        &self,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<i32> {
        self.services
            .bot
            .send_message(self.chat_id, text, Some(keyboard))
            .await
    }

    /// Sends a message and only logs a failure.
    pub async fn reply(&self, text: &str) {
        if let Err(e) = self.send_message(text).await {
            error!(chat_id = self.chat_id, error = %e, "Failed to send message");
        }
    }

    pub async fn send_location(&self, latitude: f64, longitude: f64) -> Result<i32> {
        self.services
            .bot
            .send_location(self.chat_id, latitude, longitude)
            .await
    }

    /// Replaces text and keyboard of the message a callback query came from.
    pub async fn replace_message(
        &self,
        query: &CallbackQuery,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<()> {
        let message_id = Self::callback_message_id(query)?;
        self.services
            .bot
            .edit_message_text(self.chat_id, message_id, text, Some(keyboard))
            .await
    }

    /// Deletes the message a callback query came from.
    pub async fn delete_message(&self, query: &CallbackQuery) -> Result<()> {
        let message_id = Self::callback_message_id(query)?;
        self.services.bot.delete_message(self.chat_id, message_id).await
    }

    fn callback_message_id(query: &CallbackQuery) -> Result<i32> {
        query.message.as_ref().map(|m| m.id).ok_or_else(|| {
            warn!(callback_id = %query.id, "Callback query has no message");
            TbbError::Bot(format!("callback query {} has no message", query.id))
        })
    }

    pub fn timezone_info(&self, latitude: f64, longitude: f64) -> Result<TimezoneInfo> {
        self.services.timezones.resolve(latitude, longitude)
    }

    /// Current UTC offset in seconds for the coordinates the user shared.
    pub async fn timezone_offset(&self) -> Result<i32> {
        let (latitude, longitude) = {
            let user = self.user.lock().await;
            if !user.info.has_coordinates() {
                return Err(HandlerError::NoCoordinates.into());
            }
            (user.info.latitude, user.info.longitude)
        };
        Ok(self.timezone_info(latitude, longitude)?.offset)
    }

    /// Stores resolved timezone details on the user and persists the record.
    pub async fn set_timezone(&self, tz: &TimezoneInfo) {
        let mut user = self.user.lock().await;
        user.info.latitude = tz.latitude;
        user.info.longitude = tz.longitude;
        user.info.location = tz.location.clone();
        user.info.zone_name = tz.zone_name.clone();
        user.info.tz_offset = Some(tz.offset);
        user.info.is_dst = tz.is_dst;
        self.persist(&user).await;
    }
}

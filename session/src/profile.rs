//! Background profile refresh.
//!
//! Copies the sender's profile onto the user record, fetches the newest profile photo and
//! persists the record. Runs on its own task; the user record is only touched under the session
//! lock, and the lock is released while the photo is downloaded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use storage::{UserPhoto, UserRecord};
use tbb_core::{Bot, Result, TbbError, Update, User};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::context::SessionContext;
use crate::files::download_file;

/// True when more than `threshold` has passed since `updated_at`.
pub fn is_stale(updated_at: DateTime<Utc>, threshold: Duration) -> bool {
    match (Utc::now() - updated_at).to_std() {
        Ok(elapsed) => elapsed > threshold,
        Err(_) => false,
    }
}

/// Clears the in-flight flag when the refresh task ends, including by panic.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Starts a refresh unless one is already running for this session.
pub(crate) fn spawn_profile_refresh(
    ctx: SessionContext,
    update: Update,
    in_flight: Arc<AtomicBool>,
) -> Option<JoinHandle<()>> {
    if in_flight.swap(true, Ordering::AcqRel) {
        debug!(chat_id = ctx.chat_id(), "Profile refresh already running");
        return None;
    }
    let guard = InFlightGuard(in_flight);

    Some(tokio::spawn(async move {
        let _guard = guard;
        match refresh_profile(&ctx, &update).await {
            Ok(true) => {}
            Ok(false) => debug!(chat_id = ctx.chat_id(), "Profile refresh skipped"),
            Err(e) => error!(chat_id = ctx.chat_id(), error = %e, "Profile refresh failed"),
        }
    }))
}

/// Runs one refresh. Returns `Ok(false)` when the guard conditions no longer hold.
pub async fn refresh_profile(ctx: &SessionContext, update: &Update) -> Result<bool> {
    if !update.is_private_message() {
        return Ok(false);
    }
    let Some(sender) = update.sender() else {
        return Ok(false);
    };

    {
        let mut user = ctx.lock_user().await;
        if !is_stale(user.updated_at, ctx.settings().profile_refresh_after) {
            return Ok(false);
        }
        copy_profile(&mut user, sender);
    }

    let photo = match fetch_profile_photo(ctx.bot(), sender.id).await {
        Ok(photo) => photo,
        Err(e) => {
            warn!(chat_id = ctx.chat_id(), error = %e, "Failed to fetch profile photo");
            UserPhoto::default()
        }
    };

    let mut user = ctx.lock_user().await;
    user.photo = photo;
    // Only a persisted refresh counts; a failed save leaves the record stale for the next attempt.
    let previous = std::mem::replace(&mut user.updated_at, Utc::now());
    if let Err(e) = ctx.store().save(&user).await {
        user.updated_at = previous;
        return Err(TbbError::Database(e.to_string()));
    }

    info!(
        chat_id = ctx.chat_id(),
        has_photo = !user.photo.is_empty(),
        "Refreshed user profile"
    );
    Ok(true)
}

fn copy_profile(user: &mut UserRecord, sender: &User) {
    user.first_name = sender.first_name.clone();
    user.last_name = sender.last_name.clone().unwrap_or_default();
    user.username = sender.username.clone().unwrap_or_default();
    user.language_code = sender.language_code.clone().unwrap_or_default();
    user.is_bot = sender.is_bot;
    user.is_premium = sender.is_premium;
    user.added_to_attachment_menu = sender.added_to_attachment_menu;
    user.can_join_groups = sender.can_join_groups;
    user.can_read_all_group_messages = sender.can_read_all_group_messages;
    user.supports_inline_queries = sender.supports_inline_queries;
    user.can_connect_to_business = sender.can_connect_to_business;
    user.has_main_web_app = sender.has_main_web_app;
}

/// Largest size of the newest profile photo; an empty photo when the user has none.
pub async fn fetch_profile_photo(bot: &dyn Bot, user_id: i64) -> Result<UserPhoto> {
    let photos = bot.get_user_profile_photos(user_id, 0, 1).await?;
    debug!(user_id, total = photos.total_count, "Fetched user profile photos");

    let Some(size) = photos.newest_largest() else {
        return Ok(UserPhoto::default());
    };

    let file = download_file(bot, &size.file_id).await?;
    Ok(UserPhoto {
        file_id: size.file_id.clone(),
        file_unique_id: size.file_unique_id.clone(),
        file_size: size.file_size.unwrap_or(file.size),
        file_hash: file.hash,
        file_data: file.data,
        width: size.width,
        height: size.height,
    })
}

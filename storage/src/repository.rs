use async_trait::async_trait;

use crate::error::Result;
use crate::models::UserRecord;

/// Persistence contract for user records, keyed by chat identity.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Loads the record for `chat_id`; `Ok(None)` when the user has never been saved.
    async fn find_by_chat_id(&self, chat_id: i64) -> Result<Option<UserRecord>>;

    /// Inserts or replaces the record together with its info and photo sub-records.
    async fn save(&self, user: &UserRecord) -> Result<()>;
}

//! In-memory [`UserStore`] for development and tests. Data is lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::UserRecord;
use crate::repository::UserStore;

#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<i64, UserRecord>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_chat_id(&self, chat_id: i64) -> Result<Option<UserRecord>> {
        Ok(self.users.read().await.get(&chat_id).cloned())
    }

    async fn save(&self, user: &UserRecord) -> Result<()> {
        self.users.write().await.insert(user.chat_id, user.clone());
        Ok(())
    }
}

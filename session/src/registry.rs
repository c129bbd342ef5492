//! Session registry and dispatcher.
//!
//! [`SessionDispatcher`] keeps one worker per chat identity, fed through an unbounded channel so
//! updates for the same chat are handled in arrival order while different chats run in parallel.

use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tbb_core::Update;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::account::AccountContext;
use crate::conversation::Conversation;
use crate::session::Session;

/// Removal of a session, requested by the session itself on eviction.
pub trait SessionRegistry: Send + Sync {
    /// Unregisters the chat's session. `queue` is the evicted worker's receiver: the registry
    /// closes it and forwards anything still queued, in order, to the chat's next session.
    fn delete_session(&self, chat_id: i64, queue: &mut mpsc::UnboundedReceiver<Update>);
}

type SessionSender = mpsc::UnboundedSender<Update>;

pub struct SessionDispatcher<S: Conversation> {
    this: Weak<Self>,
    account: Arc<AccountContext<S>>,
    sessions: DashMap<i64, SessionSender>,
}

impl<S: Conversation> SessionDispatcher<S> {
    pub fn new(account: Arc<AccountContext<S>>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            account,
            sessions: DashMap::new(),
        })
    }

    pub fn account(&self) -> &Arc<AccountContext<S>> {
        &self.account
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn has_session(&self, chat_id: i64) -> bool {
        self.sessions.contains_key(&chat_id)
    }

    /// Routes the update to its chat's session, creating the session on first contact.
    /// Updates without a chat identity are dropped.
    pub fn dispatch(&self, update: Update) {
        let Some(chat_id) = update.chat_id().filter(|id| *id != 0) else {
            warn!(
                update_kind = update.kind_name(),
                update = %update.to_json(),
                "Dropping update without chat identity"
            );
            return;
        };

        match self.sessions.entry(chat_id) {
            Entry::Occupied(mut entry) => {
                if let Err(mpsc::error::SendError(update)) = entry.get().send(update) {
                    warn!(chat_id, "Session worker stopped, starting a new session");
                    if let Some(tx) = self.start_session(chat_id, vec![update]) {
                        entry.insert(tx);
                    }
                }
            }
            Entry::Vacant(entry) => {
                if let Some(tx) = self.start_session(chat_id, vec![update]) {
                    entry.insert(tx);
                }
            }
        }
    }

    /// Spawns a worker for `chat_id` with `pending` already queued.
    fn start_session(&self, chat_id: i64, pending: Vec<Update>) -> Option<SessionSender> {
        let Some(registry) = self.this.upgrade() else {
            error!(chat_id, "Dispatcher is shutting down, dropping update");
            return None;
        };
        let registry: Arc<dyn SessionRegistry> = registry;

        let (tx, rx) = mpsc::unbounded_channel();
        for update in pending {
            if tx.send(update).is_err() {
                error!(chat_id, "Failed to queue update for new session");
            }
        }

        let account = self.account.clone();
        tokio::spawn(async move {
            let session = Session::new(chat_id, account, registry).await;
            session.run(rx).await;
        });
        debug!(chat_id, "Spawned session worker");
        Some(tx)
    }
}

impl<S: Conversation> SessionRegistry for SessionDispatcher<S> {
    fn delete_session(&self, chat_id: i64, queue: &mut mpsc::UnboundedReceiver<Update>) {
        // The entry lock keeps `dispatch` from sending to this chat until the hand-off is done.
        let entry = self.sessions.entry(chat_id);
        queue.close();
        let mut pending = Vec::new();
        while let Ok(update) = queue.try_recv() {
            pending.push(update);
        }

        if pending.is_empty() {
            if let Entry::Occupied(entry) = entry {
                entry.remove();
                info!(chat_id, remaining = self.sessions.len(), "Session removed");
            }
            return;
        }

        info!(
            chat_id,
            pending = pending.len(),
            "Session evicted with queued updates, handing them to a new session"
        );
        let Some(tx) = self.start_session(chat_id, pending) else {
            if let Entry::Occupied(entry) = entry {
                entry.remove();
            }
            return;
        };
        match entry {
            Entry::Occupied(mut entry) => {
                entry.insert(tx);
            }
            Entry::Vacant(entry) => {
                entry.insert(tx);
            }
        }
    }
}

//! Session: one per chat identity.
//!
//! Owns the conversation state, the last matched command, the update handler and the inactivity
//! timer. [`Session::update`] runs the dispatch pipeline for one update; [`Session::run`] is the
//! per-chat worker loop that feeds updates in arrival order and evicts the session when idle.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use futures::FutureExt;
use storage::UserRecord;
use tbb_core::{Update, UpdateKind};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::account::AccountContext;
use crate::command::Command;
use crate::context::SessionContext;
use crate::conversation::{Continuation, Conversation};
use crate::handler::UpdateHandler;
use crate::profile::{is_stale, spawn_profile_refresh};
use crate::registry::SessionRegistry;
use crate::timer::InactivityTimer;

pub struct Session<S: Conversation> {
    ctx: SessionContext,
    account: Arc<AccountContext<S>>,
    handler: Box<dyn UpdateHandler<S>>,
    state: Continuation<S>,
    command: Option<Command<S>>,
    timer: InactivityTimer,
    registry: Arc<dyn SessionRegistry>,
    refresh_in_flight: Arc<AtomicBool>,
}

enum WorkerEvent {
    Update(Update),
    Closed,
    Expired,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<S: Conversation> Session<S> {
    /// Loads (or defaults) the user record, creates the handler and arms the inactivity timer.
    ///
    /// # Panics
    ///
    /// Panics when `chat_id` is zero.
    pub async fn new(
        chat_id: i64,
        account: Arc<AccountContext<S>>,
        registry: Arc<dyn SessionRegistry>,
    ) -> Self {
        assert_ne!(chat_id, 0, "missing chat ID");

        let user = match account.store().find_by_chat_id(chat_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                info!(chat_id, "No stored user, starting with a new record");
                UserRecord::new(chat_id)
            }
            Err(e) => {
                error!(chat_id, error = %e, "Failed to load user, starting with a new record");
                UserRecord::new(chat_id)
            }
        };

        let ctx = SessionContext::new(chat_id, user, account.services().clone());
        let handler = account.new_handler();
        let timer = InactivityTimer::new(account.settings().session_timeout);

        info!(chat_id, "Session created");

        Self {
            ctx,
            account,
            handler,
            state: None,
            command: None,
            timer,
            registry,
            refresh_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.ctx.chat_id()
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Conversation in flight, if any.
    pub fn state(&self) -> Option<&S> {
        self.state.as_ref()
    }

    /// Command matched by the most recent command update; cleared when an update starts a new
    /// exchange through the initial handlers.
    pub fn command(&self) -> Option<&Command<S>> {
        self.command.as_ref()
    }

    /// Processes one update. Panics raised while handling are logged and swallowed; the
    /// conversation in flight is dropped and the session keeps serving.
    #[instrument(skip(self, update), fields(chat_id = self.ctx.chat_id(), update_kind = update.kind_name()))]
    pub async fn update(&mut self, update: &Update) {
        self.timer.reset();
        debug!(timeout = ?self.timer.timeout(), "Session timeout reset");

        let outcome = AssertUnwindSafe(self.process(update)).catch_unwind().await;
        if let Err(payload) = outcome {
            error!(
                panic = %panic_message(payload.as_ref()),
                backtrace = %Backtrace::force_capture(),
                "Recovered panic in update"
            );
            self.state = None;
        }
    }

    async fn process(&mut self, update: &Update) {
        let chat_id = self.ctx.chat_id();

        if !self.account.settings().is_allowed(chat_id) {
            if self.ctx.is_user_active().await {
                self.ctx.disable_user().await;
            }
            let username = self.ctx.lock_user().await.username.clone();
            warn!(
                username = %username,
                update = %update.to_json(),
                "Denied access for user"
            );
            return;
        }

        if update.is_private_message() {
            let updated_at = self.ctx.lock_user().await.updated_at;
            if is_stale(updated_at, self.account.settings().profile_refresh_after) {
                spawn_profile_refresh(
                    self.ctx.clone(),
                    update.clone(),
                    self.refresh_in_flight.clone(),
                );
            }
        }

        if let Some(command) = self.account.commands().match_update(update) {
            info!(command = %command.name, params = ?command.params, "Command received");
            if let Some(handler) = command.handler.clone() {
                self.state = handler.handle(&self.ctx, &command).await;
            }
            self.command = Some(command);
            return;
        }

        if let UpdateKind::MyChatMember(member) = &update.kind {
            self.state = self.handler.handle_my_chat_member(&self.ctx, member).await;
            return;
        }

        self.state = match self.state.take() {
            None => {
                self.command = None;
                self.dispatch_initial(update).await
            }
            Some(state) => state.resume(&self.ctx, update).await,
        };
    }

    async fn dispatch_initial(&mut self, update: &Update) -> Continuation<S> {
        let ctx = &self.ctx;
        let handler = &mut self.handler;
        match &update.kind {
            UpdateKind::Message(m) => handler.handle_message(ctx, m).await,
            UpdateKind::EditedMessage(m) => handler.handle_edited_message(ctx, m).await,
            UpdateKind::ChannelPost(m) => handler.handle_channel_post(ctx, m).await,
            UpdateKind::EditedChannelPost(m) => handler.handle_edited_channel_post(ctx, m).await,
            UpdateKind::InlineQuery(q) => handler.handle_inline_query(ctx, q).await,
            UpdateKind::ChosenInlineResult(r) => handler.handle_chosen_inline_result(ctx, r).await,
            UpdateKind::CallbackQuery(q) => handler.handle_callback_query(ctx, q).await,
            UpdateKind::ShippingQuery(q) => handler.handle_shipping_query(ctx, q).await,
            UpdateKind::PreCheckoutQuery(q) => handler.handle_pre_checkout_query(ctx, q).await,
            UpdateKind::ChatMember(m) => handler.handle_chat_member(ctx, m).await,
            UpdateKind::ChatJoinRequest(r) => handler.handle_chat_join_request(ctx, r).await,
            UpdateKind::MyChatMember(m) => handler.handle_my_chat_member(ctx, m).await,
            UpdateKind::Unknown(_) => handler.handle_unknown(ctx, update).await,
        }
    }

    /// Worker loop: handles queued updates in order until the channel closes or the session has
    /// been idle for the configured timeout, in which case it evicts itself.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Update>) {
        loop {
            let event = tokio::select! {
                biased;
                update = rx.recv() => update.map_or(WorkerEvent::Closed, WorkerEvent::Update),
                _ = self.timer.expired() => WorkerEvent::Expired,
            };

            match event {
                WorkerEvent::Update(update) => self.update(&update).await,
                WorkerEvent::Closed => {
                    debug!(chat_id = self.chat_id(), "Session channel closed");
                    break;
                }
                WorkerEvent::Expired => {
                    self.destruct(&mut rx);
                    break;
                }
            }
        }
    }

    /// Removes this session from the registry. Updates still in `queue` go to the chat's next
    /// session.
    pub fn destruct(&self, queue: &mut mpsc::UnboundedReceiver<Update>) {
        self.registry.delete_session(self.chat_id(), queue);
        info!(chat_id = self.chat_id(), "Deleted session after inactivity");
    }
}

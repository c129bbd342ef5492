//! Shared test support: a recording [`Bot`], a recording [`SessionRegistry`], update builders
//! and a small bot state/handler set used across the session tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use session::builtin::BuiltinState;
use session::{
    AccountContext, Command, CommandHandler, Continuation, Conversation, SessionContext,
    SessionRegistry, SessionSettings, UpdateHandler,
};
use mockall::mock;
use storage::{InMemoryUserStore, UserRecord, UserStore};
use tbb_core::{
    BotCommand, CallbackQuery, Chat, ChatKind, ChatMember, ChatMemberStatus, ChatMemberUpdated,
    FileInfo, InlineKeyboard, InlineQuery, Location, Message, PhotoSize, Result, TbbError, Update,
    LookupTimezoneResolver, UpdateKind, User, UserProfilePhotos,
};
use tokio::sync::mpsc;

// ---------- Bot ----------

#[derive(Debug, Clone, PartialEq)]
pub enum BotCall {
    SendMessage {
        chat_id: i64,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    EditMessageText {
        chat_id: i64,
        message_id: i32,
        text: String,
    },
    DeleteMessage {
        chat_id: i64,
        message_id: i32,
    },
    SendLocation {
        chat_id: i64,
        latitude: f64,
        longitude: f64,
    },
    GetUserProfilePhotos {
        user_id: i64,
    },
    GetFile {
        file_id: String,
    },
    DownloadFile {
        path: String,
    },
    SetMyCommands(Vec<BotCommand>),
    DeleteMyCommands,
}

/// Records every call; profile photos and file content are configurable.
#[derive(Default)]
pub struct MockBot {
    calls: Mutex<Vec<BotCall>>,
    photos: Mutex<UserProfilePhotos>,
    file_data: Mutex<Vec<u8>>,
    fail_photos: AtomicBool,
}

impl MockBot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// One profile photo with two sizes; the larger one downloads `data`.
    pub fn with_photo(data: &[u8]) -> Arc<Self> {
        let bot = Self::default();
        *bot.photos.lock().unwrap() = UserProfilePhotos {
            total_count: 1,
            photos: vec![vec![
                PhotoSize {
                    file_id: "photo-small".to_string(),
                    file_unique_id: "unique-small".to_string(),
                    width: 160,
                    height: 160,
                    file_size: Some(100),
                },
                PhotoSize {
                    file_id: "photo-big".to_string(),
                    file_unique_id: "unique-big".to_string(),
                    width: 640,
                    height: 640,
                    file_size: Some(data.len() as u32),
                },
            ]],
        };
        *bot.file_data.lock().unwrap() = data.to_vec();
        Arc::new(bot)
    }

    pub fn fail_photos(&self) {
        self.fail_photos.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<BotCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Texts of all sent messages, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BotCall::SendMessage { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.sent_texts().pop()
    }

    pub fn photo_requests(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, BotCall::GetUserProfilePhotos { .. }))
            .count()
    }

    fn record(&self, call: BotCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl tbb_core::Bot for MockBot {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<i32> {
        self.record(BotCall::SendMessage {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(self.calls.lock().unwrap().len() as i32)
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        _keyboard: Option<InlineKeyboard>,
    ) -> Result<()> {
        self.record(BotCall::EditMessageText {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()> {
        self.record(BotCall::DeleteMessage {
            chat_id,
            message_id,
        });
        Ok(())
    }

    async fn send_location(&self, chat_id: i64, latitude: f64, longitude: f64) -> Result<i32> {
        self.record(BotCall::SendLocation {
            chat_id,
            latitude,
            longitude,
        });
        Ok(self.calls.lock().unwrap().len() as i32)
    }

    async fn get_user_profile_photos(
        &self,
        user_id: i64,
        _offset: u32,
        _limit: u8,
    ) -> Result<UserProfilePhotos> {
        self.record(BotCall::GetUserProfilePhotos { user_id });
        if self.fail_photos.load(Ordering::SeqCst) {
            return Err(TbbError::Bot("network down".to_string()));
        }
        Ok(self.photos.lock().unwrap().clone())
    }

    async fn get_file(&self, file_id: &str) -> Result<FileInfo> {
        self.record(BotCall::GetFile {
            file_id: file_id.to_string(),
        });
        Ok(FileInfo {
            file_id: file_id.to_string(),
            file_unique_id: format!("unique-{}", file_id),
            file_size: self.file_data.lock().unwrap().len() as u32,
            path: format!("photos/{}.jpg", file_id),
        })
    }

    async fn download_file(&self, path: &str) -> Result<Vec<u8>> {
        self.record(BotCall::DownloadFile {
            path: path.to_string(),
        });
        Ok(self.file_data.lock().unwrap().clone())
    }

    async fn set_my_commands(&self, commands: Vec<BotCommand>) -> Result<()> {
        self.record(BotCall::SetMyCommands(commands));
        Ok(())
    }

    async fn delete_my_commands(&self) -> Result<()> {
        self.record(BotCall::DeleteMyCommands);
        Ok(())
    }
}

// ---------- Store ----------

mock! {
    pub Store {}

    #[async_trait]
    impl UserStore for Store {
        async fn find_by_chat_id(&self, chat_id: i64) -> storage::Result<Option<UserRecord>>;
        async fn save(&self, user: &UserRecord) -> storage::Result<()>;
    }
}

// ---------- Registry ----------

#[derive(Default)]
pub struct RecordingRegistry {
    deleted: Mutex<Vec<i64>>,
    handed_back: Mutex<Vec<Update>>,
}

impl RecordingRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn deleted(&self) -> Vec<i64> {
        self.deleted.lock().unwrap().clone()
    }

    /// Updates still queued when a session was deleted.
    pub fn handed_back(&self) -> Vec<Update> {
        self.handed_back.lock().unwrap().clone()
    }
}

impl SessionRegistry for RecordingRegistry {
    fn delete_session(&self, chat_id: i64, queue: &mut mpsc::UnboundedReceiver<Update>) {
        self.deleted.lock().unwrap().push(chat_id);
        queue.close();
        while let Ok(update) = queue.try_recv() {
            self.handed_back.lock().unwrap().push(update);
        }
    }
}

// ---------- Updates ----------

pub fn user(id: i64) -> User {
    User {
        id,
        first_name: "Ada".to_string(),
        last_name: Some("Lovelace".to_string()),
        username: Some("ada".to_string()),
        language_code: Some("en".to_string()),
        ..Default::default()
    }
}

fn message(chat: Chat, from: i64) -> Message {
    Message {
        id: 1,
        chat,
        from: Some(user(from)),
        date: Utc::now(),
        text: None,
        location: None,
    }
}

pub fn text_update(chat_id: i64, text: &str) -> Update {
    let mut m = message(Chat::private(chat_id), chat_id);
    m.text = Some(text.to_string());
    Update::new(1, UpdateKind::Message(m))
}

pub fn group_text_update(chat_id: i64, from: i64, text: &str) -> Update {
    let chat = Chat {
        id: chat_id,
        kind: ChatKind::Group,
        title: Some("group".to_string()),
        ..Default::default()
    };
    let mut m = message(chat, from);
    m.text = Some(text.to_string());
    Update::new(1, UpdateKind::Message(m))
}

pub fn location_update(chat_id: i64, latitude: f64, longitude: f64) -> Update {
    let mut m = message(Chat::private(chat_id), chat_id);
    m.location = Some(Location {
        latitude,
        longitude,
    });
    Update::new(1, UpdateKind::Message(m))
}

pub fn callback_update(chat_id: i64, data: &str) -> Update {
    let mut m = message(Chat::private(chat_id), chat_id);
    m.id = 77;
    Update::new(
        1,
        UpdateKind::CallbackQuery(CallbackQuery {
            id: "cb".to_string(),
            from: user(chat_id),
            message: Some(m),
            data: Some(data.to_string()),
        }),
    )
}

pub fn inline_query_update(chat_id: i64) -> Update {
    Update::new(
        1,
        UpdateKind::InlineQuery(InlineQuery {
            id: "q".to_string(),
            from: user(chat_id),
            query: "abc".to_string(),
            offset: String::new(),
        }),
    )
}

pub fn my_chat_member_update(chat_id: i64, status: ChatMemberStatus) -> Update {
    let bot_user = User {
        id: 1,
        is_bot: true,
        first_name: "tbb".to_string(),
        ..Default::default()
    };
    Update::new(
        1,
        UpdateKind::MyChatMember(ChatMemberUpdated {
            chat: Chat::private(chat_id),
            from: user(chat_id),
            date: Utc::now(),
            old_chat_member: ChatMember {
                user: bot_user.clone(),
                status: ChatMemberStatus::Member,
            },
            new_chat_member: ChatMember {
                user: bot_user,
                status,
            },
        }),
    )
}

pub fn unknown_update() -> Update {
    Update::new(1, UpdateKind::Unknown(serde_json::json!({"update_id": 1, "poll": {}})))
}

// ---------- Bot state and handlers ----------

/// Bot state type embedding the built-in dialogs plus one own state.
#[derive(Debug, Clone, PartialEq)]
pub enum TestState {
    Builtin(BuiltinState),
    /// Waits for a text message and greets it.
    AwaitName,
}

impl From<BuiltinState> for TestState {
    fn from(state: BuiltinState) -> Self {
        TestState::Builtin(state)
    }
}

#[async_trait]
impl Conversation for TestState {
    async fn resume(self, ctx: &SessionContext, update: &Update) -> Continuation<Self> {
        match self {
            TestState::Builtin(state) => state.resume(ctx, update).await.map(TestState::Builtin),
            TestState::AwaitName => match update.text() {
                Some(name) => {
                    ctx.reply(&format!("Hello {}", name)).await;
                    None
                }
                None => Some(TestState::AwaitName),
            },
        }
    }
}

/// Replies with the method name; "hi" starts the name dialog.
pub struct TestHandler;

#[async_trait]
impl UpdateHandler<TestState> for TestHandler {
    async fn handle_message(
        &mut self,
        ctx: &SessionContext,
        message: &Message,
    ) -> Continuation<TestState> {
        match message.text() {
            Some("hi") => {
                ctx.reply("What's your name?").await;
                Some(TestState::AwaitName)
            }
            Some(text) => {
                ctx.reply(&format!("echo: {}", text)).await;
                None
            }
            None => {
                ctx.reply("message").await;
                None
            }
        }
    }

    async fn handle_callback_query(
        &mut self,
        ctx: &SessionContext,
        _query: &CallbackQuery,
    ) -> Continuation<TestState> {
        ctx.reply("callback").await;
        None
    }

    async fn handle_inline_query(
        &mut self,
        ctx: &SessionContext,
        _query: &InlineQuery,
    ) -> Continuation<TestState> {
        ctx.reply("inline").await;
        None
    }
}

/// Enables the user and ends.
pub struct EnableOnly;

#[async_trait]
impl CommandHandler<TestState> for EnableOnly {
    async fn handle(
        &self,
        ctx: &SessionContext,
        _command: &Command<TestState>,
    ) -> Continuation<TestState> {
        ctx.enable_user().await;
        None
    }
}

/// Replies with its parameters joined by commas.
pub struct EchoParams;

#[async_trait]
impl CommandHandler<TestState> for EchoParams {
    async fn handle(
        &self,
        ctx: &SessionContext,
        command: &Command<TestState>,
    ) -> Continuation<TestState> {
        ctx.reply(&format!("params: {}", command.params.join(","))).await;
        None
    }
}

/// Always panics.
pub struct Boom;

#[async_trait]
impl CommandHandler<TestState> for Boom {
    async fn handle(
        &self,
        _ctx: &SessionContext,
        _command: &Command<TestState>,
    ) -> Continuation<TestState> {
        panic!("boom");
    }
}

pub fn settings(allowed: Vec<i64>) -> SessionSettings {
    SessionSettings {
        allowed_chat_ids: allowed,
        session_timeout: Duration::from_secs(15 * 60),
        profile_refresh_after: Duration::from_secs(24 * 3600),
    }
}

/// Account with `/start` (hidden), `/echo`, `/boom` and the built-in commands.
pub fn account(
    bot: Arc<MockBot>,
    store: Arc<dyn UserStore>,
    settings: SessionSettings,
) -> Arc<AccountContext<TestState>> {
    use session::builtin::{DisableCommand, EnableCommand, HelpCommand, TimezoneCommand};

    let account = AccountContext::<TestState>::builder()
        .settings(settings)
        .bot(bot)
        .store(store)
        .timezone_resolver(Arc::new(LookupTimezoneResolver::at(winter_instant())))
        .command(Command::new("/start").handler(EnableOnly))
        .command(Command::new("/echo").description("Echo parameters").handler(EchoParams))
        .command(Command::new("/boom").handler(Boom))
        .command(
            Command::new("/enable")
                .description("Enable notifications")
                .handler(EnableCommand),
        )
        .command(
            Command::new("/disable")
                .description("Disable notifications")
                .handler(DisableCommand),
        )
        .command(Command::new("/help").description("Show help").handler(HelpCommand::default()))
        .command(
            Command::new("/timezone")
                .description("Set time zone")
                .handler(TimezoneCommand),
        )
        .handler_factory(|| Box::new(TestHandler) as Box<dyn UpdateHandler<TestState>>)
        .build()
        .expect("account builds");
    Arc::new(account)
}

/// Mid-January noon UTC; northern zones are on standard time.
pub fn winter_instant() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
}

pub fn memory_store() -> Arc<InMemoryUserStore> {
    Arc::new(InMemoryUserStore::new())
}

/// Polls `condition` until it holds or a second has passed.
pub async fn wait_until<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Waits until `bot` has sent at least `count` messages.
pub async fn wait_for_messages(bot: &MockBot, count: usize) -> bool {
    for _ in 0..100 {
        if bot.sent_texts().len() >= count {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

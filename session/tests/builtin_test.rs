//! Integration tests for the built-in commands and location dialogs.

mod common;

use std::sync::Arc;

use chrono::Utc;
use common::*;
use session::builtin::{BuiltinState, MSG_INVALID_LOCATION, MSG_SEND_LOCATION};
use session::{AccountContext, Command, Session};
use storage::{MemberStatus, UserRecord, UserStore};
use tbb_core::{BotCommand, InlineKeyboardButton, TbbError};

fn fresh_user(chat_id: i64) -> UserRecord {
    let mut user = UserRecord::new(chat_id);
    user.first_name = "Ada".to_string();
    user.username = "ada".to_string();
    user.updated_at = Utc::now();
    user
}

async fn start(user: UserRecord) -> (Session<TestState>, Arc<MockBot>) {
    let bot = MockBot::new();
    let store = memory_store();
    let chat_id = user.chat_id;
    store.save(&user).await.unwrap();
    let account = account(bot.clone(), store, settings(vec![]));
    let session = Session::new(chat_id, account, RecordingRegistry::new()).await;
    (session, bot)
}

fn last_keyboard(bot: &MockBot) -> Option<Vec<Vec<InlineKeyboardButton>>> {
    bot.calls().into_iter().rev().find_map(|c| match c {
        BotCall::SendMessage { keyboard, .. } => keyboard,
        _ => None,
    })
}

/// **Test: `/enable` without a stored zone walks through the location dialog.**
///
/// **Setup:** Inactive user without timezone.
/// **Action:** `/enable`, a stray text, "update" answer, a text instead of a location, a Berlin location.
/// **Expected:** User enabled; dialog asks for a location until one arrives; zone stored as Europe/Berlin.
#[tokio::test]
async fn test_enable_without_zone_requests_location() {
    let (mut session, bot) = start(fresh_user(42)).await;

    session.update(&text_update(42, "/enable")).await;
    assert!(session.context().is_user_active().await);
    assert_eq!(
        session.state(),
        Some(&TestState::Builtin(BuiltinState::AwaitLocationAnswer))
    );
    assert_eq!(
        last_keyboard(&bot),
        Some(vec![vec![
            InlineKeyboardButton::callback("Yes", "update"),
            InlineKeyboardButton::callback("No", ""),
        ]])
    );

    // Only a callback answers the question.
    session.update(&text_update(42, "what?")).await;
    assert_eq!(
        session.state(),
        Some(&TestState::Builtin(BuiltinState::AwaitLocationAnswer))
    );

    session.update(&callback_update(42, "update")).await;
    assert_eq!(bot.last_text().as_deref(), Some(MSG_SEND_LOCATION));
    assert_eq!(
        session.state(),
        Some(&TestState::Builtin(BuiltinState::AwaitLocation { enabling: true }))
    );

    session.update(&text_update(42, "Berlin")).await;
    assert_eq!(bot.last_text().as_deref(), Some(MSG_INVALID_LOCATION));
    assert!(session.state().is_some());

    session.update(&location_update(42, 52.52, 13.405)).await;
    assert!(session.state().is_none());
    assert_eq!(
        bot.last_text().as_deref(),
        Some(
            "I received your location update: Latitude = 52.520000 | Longitude = 13.405000.\n\
             Your notifications are now enabled."
        )
    );

    let info = session.context().user().await.info;
    assert_eq!(info.zone_name, "CET");
    assert_eq!(info.location, "Europe/Berlin");
    assert_eq!(info.tz_offset, Some(3600));
    assert!(!info.is_dst);
    assert_eq!(session.context().timezone_offset().await.unwrap(), 3600);
}

/// **Test: `/enable` with a stored zone offers to keep it.**
#[tokio::test]
async fn test_enable_with_zone_keeps_location() {
    let mut user = fresh_user(42);
    user.info.latitude = 52.52;
    user.info.longitude = 13.405;
    user.info.zone_name = "UTC+1".to_string();
    let (mut session, bot) = start(user).await;

    session.update(&text_update(42, "/enable")).await;

    assert!(bot.calls().contains(&BotCall::SendLocation {
        chat_id: 42,
        latitude: 52.52,
        longitude: 13.405,
    }));
    assert_eq!(bot.last_text().as_deref(), Some("Is this location still correct?"));
    assert_eq!(
        last_keyboard(&bot),
        Some(vec![vec![
            InlineKeyboardButton::callback("Yes", "keep"),
            InlineKeyboardButton::callback("No", "update"),
        ]])
    );

    session.update(&callback_update(42, "keep")).await;

    assert!(session.state().is_none());
    assert_eq!(
        bot.last_text().as_deref(),
        Some("Ok, then I'll keep your current time zone (UTC+1)")
    );
    assert_eq!(session.context().user().await.info.zone_name, "UTC+1");
}

/// **Test: Declining to share a location falls back to UTC.**
#[tokio::test]
async fn test_enable_declined_uses_utc() {
    let (mut session, bot) = start(fresh_user(42)).await;

    session.update(&text_update(42, "/enable")).await;
    session.update(&callback_update(42, "")).await;

    assert!(session.state().is_none());
    assert_eq!(
        bot.last_text().as_deref(),
        Some("Ok, then I will use UTC as your time zone. Your account is now enabled.")
    );
    assert!(session.context().is_user_active().await);
}

/// **Test: `/disable` notifies, then deactivates.**
#[tokio::test]
async fn test_disable_command() {
    let mut user = fresh_user(42);
    user.info.is_active = true;
    user.info.status = MemberStatus::Member;
    let (mut session, bot) = start(user).await;

    session.update(&text_update(42, "/disable")).await;

    assert_eq!(
        bot.last_text().as_deref(),
        Some("You won't receive any updates anymore. Send /enable to enable updates again.")
    );
    let info = session.context().user().await.info;
    assert!(!info.is_active);
    assert_eq!(info.status, MemberStatus::Kicked);
}

/// **Test: `/help` greets the user by name.**
#[tokio::test]
async fn test_help_command() {
    let (mut session, bot) = start(fresh_user(42)).await;

    session.update(&text_update(42, "/help")).await;

    let text = bot.last_text().unwrap();
    assert!(text.starts_with("Hi Ada"));
    assert!(text.contains("/disable"));
    assert!(session.state().is_none());
}

/// **Test: `/timezone` stores the zone without the enable confirmation.**
#[tokio::test]
async fn test_timezone_command() {
    let (mut session, bot) = start(fresh_user(42)).await;

    session.update(&text_update(42, "/timezone")).await;
    assert_eq!(
        bot.last_text().as_deref(),
        Some("Hi Ada, please send me a location in order to set the correct time zone for you.")
    );
    assert_eq!(
        session.state(),
        Some(&TestState::Builtin(BuiltinState::AwaitLocation { enabling: false }))
    );

    session.update(&location_update(42, 40.71, -74.0)).await;

    assert_eq!(
        bot.last_text().as_deref(),
        Some("I received your location update: Latitude = 40.710000 | Longitude = -74.000000.")
    );
    let info = session.context().user().await.info;
    assert_eq!(info.zone_name, "EST");
    assert_eq!(info.location, "America/New_York");
    assert_eq!(info.tz_offset, Some(-5 * 3600));
    assert!(!info.is_active);
}

/// **Test: Timezone offset needs coordinates.**
#[tokio::test]
async fn test_timezone_offset_without_coordinates() {
    let (session, _) = start(fresh_user(42)).await;

    let err = session.context().timezone_offset().await.unwrap_err();
    assert!(matches!(err, TbbError::Handler(_)));
}

/// **Test: The command menu lists visible commands without the prefix.**
#[tokio::test]
async fn test_register_command_menu() {
    let bot = MockBot::new();
    let account = account(bot.clone(), memory_store(), settings(vec![]));

    account.register_command_menu().await.unwrap();

    let expected: Vec<BotCommand> = [
        ("disable", "Disable notifications"),
        ("echo", "Echo parameters"),
        ("enable", "Enable notifications"),
        ("help", "Show help"),
        ("timezone", "Set time zone"),
    ]
    .into_iter()
    .map(|(command, description)| BotCommand {
        command: command.to_string(),
        description: description.to_string(),
    })
    .collect();
    assert_eq!(bot.calls(), vec![BotCall::SetMyCommands(expected)]);
}

/// **Test: Without visible commands the menu is cleared.**
#[tokio::test]
async fn test_register_empty_command_menu() {
    let bot = MockBot::new();
    let account = AccountContext::<TestState>::builder()
        .bot(bot.clone())
        .store(memory_store())
        .command(Command::new("/start"))
        .build()
        .unwrap();

    account.register_command_menu().await.unwrap();

    assert_eq!(bot.calls(), vec![BotCall::DeleteMyCommands]);
}

/// **Test: A command without a handler is recorded but leaves the conversation alone.**
#[tokio::test]
async fn test_command_without_handler_keeps_state() {
    let bot = MockBot::new();
    let store = memory_store();
    store.save(&fresh_user(42)).await.unwrap();
    let account = AccountContext::<TestState>::builder()
        .bot(bot.clone())
        .store(store)
        .command(Command::new("/noop"))
        .command(Command::new("/timezone").handler(session::builtin::TimezoneCommand))
        .build()
        .unwrap();
    let mut session = Session::new(42, Arc::new(account), RecordingRegistry::new()).await;

    session.update(&text_update(42, "/timezone")).await;
    session.update(&text_update(42, "/noop")).await;

    assert_eq!(session.command().map(|c| c.name.as_str()), Some("/noop"));
    assert_eq!(
        session.state(),
        Some(&TestState::Builtin(BuiltinState::AwaitLocation { enabling: false }))
    );
}

/// **Test: Building an account without a bot client fails.**
#[test]
fn test_builder_requires_bot() {
    let result = AccountContext::<TestState>::builder()
        .store(memory_store())
        .build();

    assert!(matches!(result, Err(TbbError::Config(_))));
}

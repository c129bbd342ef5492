//! Inbound update model.
//!
//! [`Update`] is a closed set of variants mirroring the platform's update kinds. Payloads keep the
//! Bot API field names so any transport that can produce Bot API JSON can feed the session engine
//! through [`Update::from_bot_api`].

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::{Chat, Message, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub offset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChosenInlineResult {
    pub result_id: String,
    pub from: User,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub invoice_payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreCheckoutQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub total_amount: i64,
    #[serde(default)]
    pub invoice_payload: String,
}

/// Membership status of a user in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMember {
    pub user: User,
    pub status: ChatMemberStatus,
}

/// Change of a member's status; for `my_chat_member` the member is the bot itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
    pub from: User,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
    pub old_chat_member: ChatMember,
    pub new_chat_member: ChatMember,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatJoinRequest {
    pub chat: Chat,
    pub from: User,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Update variants, one per platform update kind.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateKind {
    Message(Message),
    EditedMessage(Message),
    ChannelPost(Message),
    EditedChannelPost(Message),
    InlineQuery(InlineQuery),
    ChosenInlineResult(ChosenInlineResult),
    CallbackQuery(CallbackQuery),
    ShippingQuery(ShippingQuery),
    PreCheckoutQuery(PreCheckoutQuery),
    MyChatMember(ChatMemberUpdated),
    ChatMember(ChatMemberUpdated),
    ChatJoinRequest(ChatJoinRequest),
    /// Anything the engine has no variant for; keeps the raw payload for logging.
    Unknown(Value),
}

/// Single inbound update.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub id: i64,
    pub kind: UpdateKind,
}

fn parse_payload<T: DeserializeOwned>(value: &Value, key: &str) -> Option<T> {
    let payload = value.get(key)?;
    match serde_json::from_value(payload.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(update_kind = key, error = %e, "Failed to parse update payload");
            None
        }
    }
}

impl Update {
    pub fn new(id: i64, kind: UpdateKind) -> Self {
        Self { id, kind }
    }

    /// Builds an update from its Bot API JSON representation. Keys are tried in the platform's
    /// documented order; payloads that are absent or fail to parse fall through to [`UpdateKind::Unknown`].
    pub fn from_bot_api(value: Value) -> Self {
        let id = value.get("update_id").and_then(Value::as_i64).unwrap_or_default();

        let kind = if let Some(m) = parse_payload(&value, "message") {
            UpdateKind::Message(m)
        } else if let Some(m) = parse_payload(&value, "edited_message") {
            UpdateKind::EditedMessage(m)
        } else if let Some(m) = parse_payload(&value, "channel_post") {
            UpdateKind::ChannelPost(m)
        } else if let Some(m) = parse_payload(&value, "edited_channel_post") {
            UpdateKind::EditedChannelPost(m)
        } else if let Some(q) = parse_payload(&value, "inline_query") {
            UpdateKind::InlineQuery(q)
        } else if let Some(r) = parse_payload(&value, "chosen_inline_result") {
            UpdateKind::ChosenInlineResult(r)
        } else if let Some(q) = parse_payload(&value, "callback_query") {
            UpdateKind::CallbackQuery(q)
        } else if let Some(q) = parse_payload(&value, "shipping_query") {
            UpdateKind::ShippingQuery(q)
        } else if let Some(q) = parse_payload(&value, "pre_checkout_query") {
            UpdateKind::PreCheckoutQuery(q)
        } else if let Some(m) = parse_payload(&value, "my_chat_member") {
            UpdateKind::MyChatMember(m)
        } else if let Some(m) = parse_payload(&value, "chat_member") {
            UpdateKind::ChatMember(m)
        } else if let Some(r) = parse_payload(&value, "chat_join_request") {
            UpdateKind::ChatJoinRequest(r)
        } else {
            UpdateKind::Unknown(value)
        };

        Self { id, kind }
    }

    /// JSON form used when logging an update.
    pub fn to_json(&self) -> Value {
        let (key, payload) = match &self.kind {
            UpdateKind::Message(m) => ("message", serde_json::to_value(m)),
            UpdateKind::EditedMessage(m) => ("edited_message", serde_json::to_value(m)),
            UpdateKind::ChannelPost(m) => ("channel_post", serde_json::to_value(m)),
            UpdateKind::EditedChannelPost(m) => ("edited_channel_post", serde_json::to_value(m)),
            UpdateKind::InlineQuery(q) => ("inline_query", serde_json::to_value(q)),
            UpdateKind::ChosenInlineResult(r) => ("chosen_inline_result", serde_json::to_value(r)),
            UpdateKind::CallbackQuery(q) => ("callback_query", serde_json::to_value(q)),
            UpdateKind::ShippingQuery(q) => ("shipping_query", serde_json::to_value(q)),
            UpdateKind::PreCheckoutQuery(q) => ("pre_checkout_query", serde_json::to_value(q)),
            UpdateKind::MyChatMember(m) => ("my_chat_member", serde_json::to_value(m)),
            UpdateKind::ChatMember(m) => ("chat_member", serde_json::to_value(m)),
            UpdateKind::ChatJoinRequest(r) => ("chat_join_request", serde_json::to_value(r)),
            UpdateKind::Unknown(v) => return v.clone(),
        };
        let mut map = serde_json::Map::new();
        map.insert("update_id".to_string(), Value::from(self.id));
        map.insert(key.to_string(), payload.unwrap_or(Value::Null));
        Value::Object(map)
    }

    /// Short variant name for log fields.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            UpdateKind::Message(_) => "message",
            UpdateKind::EditedMessage(_) => "edited_message",
            UpdateKind::ChannelPost(_) => "channel_post",
            UpdateKind::EditedChannelPost(_) => "edited_channel_post",
            UpdateKind::InlineQuery(_) => "inline_query",
            UpdateKind::ChosenInlineResult(_) => "chosen_inline_result",
            UpdateKind::CallbackQuery(_) => "callback_query",
            UpdateKind::ShippingQuery(_) => "shipping_query",
            UpdateKind::PreCheckoutQuery(_) => "pre_checkout_query",
            UpdateKind::MyChatMember(_) => "my_chat_member",
            UpdateKind::ChatMember(_) => "chat_member",
            UpdateKind::ChatJoinRequest(_) => "chat_join_request",
            UpdateKind::Unknown(_) => "unknown",
        }
    }

    /// Chat the update belongs to, when the variant carries one.
    pub fn chat(&self) -> Option<&Chat> {
        match &self.kind {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m) => Some(&m.chat),
            UpdateKind::CallbackQuery(q) => q.message.as_ref().map(|m| &m.chat),
            UpdateKind::MyChatMember(m) | UpdateKind::ChatMember(m) => Some(&m.chat),
            UpdateKind::ChatJoinRequest(r) => Some(&r.chat),
            _ => None,
        }
    }

    /// Chat identity used to route the update to its session. Query variants without a chat
    /// use the sender's id, which equals the private chat id.
    pub fn chat_id(&self) -> Option<i64> {
        if let Some(chat) = self.chat() {
            return Some(chat.id);
        }
        self.sender().map(|u| u.id)
    }

    /// User that caused the update.
    pub fn sender(&self) -> Option<&User> {
        match &self.kind {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m) => m.from.as_ref(),
            UpdateKind::InlineQuery(q) => Some(&q.from),
            UpdateKind::ChosenInlineResult(r) => Some(&r.from),
            UpdateKind::CallbackQuery(q) => Some(&q.from),
            UpdateKind::ShippingQuery(q) => Some(&q.from),
            UpdateKind::PreCheckoutQuery(q) => Some(&q.from),
            UpdateKind::MyChatMember(m) | UpdateKind::ChatMember(m) => Some(&m.from),
            UpdateKind::ChatJoinRequest(r) => Some(&r.from),
            UpdateKind::Unknown(_) => None,
        }
    }

    /// Text of a message or edited message; commands are only read from these.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            UpdateKind::Message(m) | UpdateKind::EditedMessage(m) => m.text(),
            _ => None,
        }
    }

    /// True for a new message in a one-to-one chat.
    pub fn is_private_message(&self) -> bool {
        matches!(&self.kind, UpdateKind::Message(m) if m.chat.is_private())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_json(id: i64) -> Value {
        json!({"id": id, "is_bot": false, "first_name": "Ada", "username": "ada"})
    }

    #[test]
    fn test_from_bot_api_message() {
        let update = Update::from_bot_api(json!({
            "update_id": 7,
            "message": {
                "message_id": 1,
                "date": 1700000000,
                "chat": {"id": 42, "type": "private", "first_name": "Ada"},
                "from": user_json(42),
                "text": "/start"
            }
        }));

        assert_eq!(update.id, 7);
        assert_eq!(update.kind_name(), "message");
        assert_eq!(update.chat_id(), Some(42));
        assert_eq!(update.text(), Some("/start"));
        assert!(update.is_private_message());
        assert_eq!(update.sender().unwrap().username.as_deref(), Some("ada"));
    }

    #[test]
    fn test_from_bot_api_group_message_is_not_private() {
        let update = Update::from_bot_api(json!({
            "update_id": 8,
            "message": {
                "message_id": 2,
                "date": 1700000000,
                "chat": {"id": -100, "type": "supergroup", "title": "g"},
                "from": user_json(42),
                "text": "hi"
            }
        }));

        assert_eq!(update.chat_id(), Some(-100));
        assert!(!update.is_private_message());
    }

    #[test]
    fn test_from_bot_api_my_chat_member() {
        let update = Update::from_bot_api(json!({
            "update_id": 9,
            "my_chat_member": {
                "chat": {"id": 42, "type": "private"},
                "from": user_json(42),
                "date": 1700000000,
                "old_chat_member": {"user": user_json(1), "status": "member"},
                "new_chat_member": {"user": user_json(1), "status": "kicked", "until_date": 0}
            }
        }));

        match &update.kind {
            UpdateKind::MyChatMember(m) => {
                assert_eq!(m.new_chat_member.status, ChatMemberStatus::Kicked)
            }
            other => panic!("unexpected kind: {:?}", other),
        }
        assert_eq!(update.chat_id(), Some(42));
        assert_eq!(update.text(), None);
    }

    #[test]
    fn test_inline_query_routes_by_sender() {
        let update = Update::from_bot_api(json!({
            "update_id": 10,
            "inline_query": {"id": "q", "from": user_json(77), "query": "abc", "offset": ""}
        }));

        assert_eq!(update.kind_name(), "inline_query");
        assert_eq!(update.chat_id(), Some(77));
    }

    #[test]
    fn test_unknown_update_keeps_payload() {
        let raw = json!({"update_id": 11, "poll": {"id": "p"}});
        let update = Update::from_bot_api(raw.clone());

        assert_eq!(update.kind, UpdateKind::Unknown(raw.clone()));
        assert_eq!(update.chat_id(), None);
        assert_eq!(update.to_json(), raw);
    }
}

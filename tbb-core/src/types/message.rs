use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Chat, User};

/// Geographic point shared by the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Message, edited message or channel post. Only the fields the session engine reads are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "message_id")]
    pub id: i32,
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    #[serde(with = "chrono::serde::ts_seconds", default = "epoch")]
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

impl Message {
    /// Text content, or `None` for non-text messages.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

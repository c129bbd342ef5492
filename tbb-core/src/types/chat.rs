use serde::{Deserialize, Serialize};

/// Kind of chat as reported by the platform (`type` in the Bot API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    #[default]
    Private,
    Group,
    Supergroup,
    Channel,
}

/// Chat (private, group or channel) identity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: ChatKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl Chat {
    /// Creates a private chat with the given id.
    pub fn private(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// True for one-to-one chats between the bot and a user.
    pub fn is_private(&self) -> bool {
        self.kind == ChatKind::Private
    }
}

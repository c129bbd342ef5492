use serde::{Deserialize, Serialize};

/// Platform user as carried by inbound updates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub is_premium: bool,
    pub added_to_attachment_menu: bool,
    pub can_join_groups: bool,
    pub can_read_all_group_messages: bool,
    pub supports_inline_queries: bool,
    pub can_connect_to_business: bool,
    pub has_main_web_app: bool,
}

impl User {
    /// First name when set, otherwise the handle, otherwise an empty string.
    pub fn display_name(&self) -> &str {
        if !self.first_name.is_empty() {
            &self.first_name
        } else {
            self.username.as_deref().unwrap_or_default()
        }
    }
}

/// Converts a transport-specific user type to core [`User`].
pub trait ToCoreUser: Send + Sync {
    fn to_core(&self) -> User;
}

//! User record model for persistence.
//!
//! Maps to the `users`, `user_infos` and `user_photos` tables used by [`crate::UserRepository`].
//! Info and photo are always present on a record; an unknown user simply has them empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Relationship between the user and the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    /// Never enabled or disabled.
    #[default]
    None,
    Member,
    Kicked,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::None => "",
            MemberStatus::Member => "member",
            MemberStatus::Kicked => "kicked",
        }
    }
}

impl std::str::FromStr for MemberStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(MemberStatus::None),
            "member" => Ok(MemberStatus::Member),
            "kicked" => Ok(MemberStatus::Kicked),
            other => Err(StorageError::InvalidValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Activation state and timezone details.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserInfo {
    pub is_active: bool,
    pub status: MemberStatus,
    pub latitude: f64,
    pub longitude: f64,
    /// Resolved location name, e.g. `Etc/GMT-1`.
    pub location: String,
    pub zone_name: String,
    /// UTC offset in seconds; `None` until a location was resolved.
    pub tz_offset: Option<i32>,
    pub is_dst: bool,
}

impl UserInfo {
    /// False while both coordinates are zero (never shared).
    pub fn has_coordinates(&self) -> bool {
        !(self.latitude == 0.0 && self.longitude == 0.0)
    }
}

/// Current profile photo.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserPhoto {
    pub file_id: String,
    pub file_unique_id: String,
    pub file_size: u32,
    /// Hex-encoded SHA-256 of `file_data`.
    pub file_hash: String,
    #[serde(skip)]
    pub file_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl UserPhoto {
    pub fn is_empty(&self) -> bool {
        self.file_id.is_empty() && self.file_data.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub chat_id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub language_code: String,
    pub is_premium: bool,
    pub added_to_attachment_menu: bool,
    pub can_join_groups: bool,
    pub can_read_all_group_messages: bool,
    pub supports_inline_queries: bool,
    pub can_connect_to_business: bool,
    pub has_main_web_app: bool,
    pub info: UserInfo,
    pub photo: UserPhoto,
    pub created_at: DateTime<Utc>,
    /// Last profile refresh. Starts at the Unix epoch so a new record is immediately stale.
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Creates an inactive record with empty info and photo.
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            is_bot: false,
            first_name: String::new(),
            last_name: String::new(),
            username: String::new(),
            language_code: String::new(),
            is_premium: false,
            added_to_attachment_menu: false,
            can_join_groups: false,
            can_read_all_group_messages: false,
            supports_inline_queries: false,
            can_connect_to_business: false,
            has_main_web_app: false,
            info: UserInfo::default(),
            photo: UserPhoto::default(),
            created_at: Utc::now(),
            updated_at: DateTime::<Utc>::default(),
        }
    }
}

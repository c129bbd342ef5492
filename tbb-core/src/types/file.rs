//! File, photo and bot-menu types returned by or sent to the platform client.

use serde::{Deserialize, Serialize};

/// One size of a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub file_size: Option<u32>,
}

/// Page of a user's profile photos. Each entry lists sizes ordered smallest to largest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfilePhotos {
    pub total_count: u32,
    pub photos: Vec<Vec<PhotoSize>>,
}

impl UserProfilePhotos {
    /// Largest size of the first (newest) photo.
    pub fn newest_largest(&self) -> Option<&PhotoSize> {
        self.photos.first().and_then(|sizes| sizes.last())
    }
}

/// File metadata; `path` is what the client downloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_id: String,
    pub file_unique_id: String,
    pub file_size: u32,
    pub path: String,
}

/// Entry of the bot's command menu. `command` is sent without the leading `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(id: &str, w: u32) -> PhotoSize {
        PhotoSize {
            file_id: id.to_string(),
            file_unique_id: format!("u-{}", id),
            width: w,
            height: w,
            file_size: Some(w * 10),
        }
    }

    #[test]
    fn test_newest_largest_picks_last_size_of_first_photo() {
        let photos = UserProfilePhotos {
            total_count: 2,
            photos: vec![
                vec![size("a-small", 160), size("a-big", 640)],
                vec![size("b-small", 160), size("b-big", 640)],
            ],
        };
        assert_eq!(photos.newest_largest().unwrap().file_id, "a-big");
    }

    #[test]
    fn test_newest_largest_none_without_photos() {
        assert!(UserProfilePhotos::default().newest_largest().is_none());
    }
}

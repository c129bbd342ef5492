//! File download helper built on the platform client.

use sha2::{Digest, Sha256};
use tbb_core::{Bot, Result};
use tracing::debug;

/// Content and identity of a downloaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub file_id: String,
    pub unique_id: String,
    pub size: u32,
    /// Hex-encoded SHA-256 of `data`.
    pub hash: String,
    /// Detected from the content's magic bytes; `application/octet-stream` when unknown.
    pub mime_type: String,
    /// Extension matching `mime_type` without the dot; empty when unknown.
    pub extension: String,
    pub data: Vec<u8>,
}

const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// Resolves `file_id` to a path and downloads its content.
pub async fn download_file(bot: &dyn Bot, file_id: &str) -> Result<DownloadedFile> {
    let info = bot.get_file(file_id).await?;
    let data = bot.download_file(&info.path).await?;
    let hash = format!("{:x}", Sha256::digest(&data));
    let size = if info.file_size > 0 {
        info.file_size
    } else {
        data.len() as u32
    };

    let (mime_type, extension) = match infer::get(&data) {
        Some(kind) => (kind.mime_type().to_string(), kind.extension().to_string()),
        None => (UNKNOWN_MIME_TYPE.to_string(), String::new()),
    };

    debug!(file_id, size, hash = %hash, mime_type = %mime_type, "Downloaded file");

    Ok(DownloadedFile {
        file_id: info.file_id,
        unique_id: info.file_unique_id,
        size,
        hash,
        mime_type,
        extension,
        data,
    })
}

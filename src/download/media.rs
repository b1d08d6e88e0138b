//! A downloaded media file waiting to be uploaded.

use std::path::{Path, PathBuf};

/// What a downloaded file contains, inferred from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
    Media,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "mp4" | "mov" | "webm" | "mkv" | "m4v" => MediaKind::Video,
            "jpg" | "jpeg" | "png" | "webp" | "heic" | "gif" => MediaKind::Image,
            _ => MediaKind::Media,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Video => "Video",
            MediaKind::Image => "Image",
            MediaKind::Media => "Media",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    /// `title`, else `uploader`, else "Instagram Media"
    pub title: String,
    pub uploader: Option<String>,
    pub description: Option<String>,
    /// Unique per download; every file of this download carries it in its name.
    pub token: String,
    pub kind: MediaKind,
}

pub const DEFAULT_TITLE: &str = "Instagram Media";

/// Applies the title fallback chain.
pub fn resolve_title(title: Option<&str>, uploader: Option<&str>) -> String {
    title
        .filter(|s| !s.is_empty())
        .or(uploader.filter(|s| !s.is_empty()))
        .unwrap_or(DEFAULT_TITLE)
        .to_string()
}

/// Fresh download token.
pub fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

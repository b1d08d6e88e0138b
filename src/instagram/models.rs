//! Normalized Instagram data returned by the scraper layer.
//!
//! Every type derives `Serialize` so the CLI can dump it as JSON.

use serde::Serialize;
use serde_json::Value;

/// Instagram `media_type` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
    Carousel,
    Other(i64),
}

impl MediaType {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => MediaType::Image,
            2 => MediaType::Video,
            8 => MediaType::Carousel,
            other => MediaType::Other(other),
        }
    }

    /// Reads a numeric (or numeric string) code; `None` when absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::from_code),
            Value::String(s) => s.trim().parse::<i64>().ok().map(Self::from_code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentPost {
    pub short_code: Option<String>,
    pub url: String,
    pub caption: String,
    pub likes_count: u64,
    pub comments_count: u64,
    pub timestamp: Option<String>,
    pub media_type: Option<String>,
    pub is_video: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub username: String,
    pub full_name: String,
    pub biography: String,
    pub followers_count: u64,
    pub follows_count: u64,
    pub posts_count: u64,
    pub is_private: bool,
    pub is_verified: bool,
    pub is_banned: bool,
    pub ban_reason: Option<String>,
    pub profile_pic_url: Option<String>,
    pub hd_profile_pic_url: Option<String>,
    pub external_url: Option<String>,
    pub is_business_account: bool,
    pub recent_posts: Vec<RecentPost>,
    /// Set only on the fallback profile.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Story {
    pub id: Option<String>,
    /// Unix seconds
    pub taken_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub media_type: Option<MediaType>,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub dimensions: Option<Value>,
    pub mentions: Vec<String>,
    pub hashtags: Vec<String>,
    pub music: Option<Value>,
}

impl Story {
    pub fn is_video(&self) -> bool {
        self.media_type == Some(MediaType::Video)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reel {
    pub id: Option<String>,
    pub short_code: Option<String>,
    pub url: String,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub caption: Option<String>,
    pub likes_count: u64,
    pub comments_count: u64,
    pub play_count: u64,
    pub timestamp: Option<String>,
    /// Seconds
    pub duration: Option<f64>,
    pub owner_username: Option<String>,
    pub owner_full_name: Option<String>,
    pub is_verified: bool,
    pub music: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarouselItem {
    pub is_video: bool,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
}

impl CarouselItem {
    pub fn media_url(&self) -> Option<&str> {
        self.video_url.as_deref().or(self.image_url.as_deref())
    }

    pub fn extension(&self) -> &'static str {
        if self.is_video {
            "mp4"
        } else {
            "jpg"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: Option<String>,
    pub short_code: Option<String>,
    pub url: String,
    pub media_type: Option<MediaType>,
    pub media_urls: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub caption: Option<String>,
    pub likes_count: u64,
    pub comments_count: u64,
    pub timestamp: Option<String>,
    pub owner_username: Option<String>,
    pub owner_full_name: Option<String>,
    pub is_verified: bool,
    pub location: Option<String>,
    pub is_carousel: bool,
    pub carousel_items: Vec<CarouselItem>,
}

impl Post {
    pub fn is_video(&self) -> bool {
        self.media_type == Some(MediaType::Video)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleKind {
    Video,
    Image,
    Carousel,
    Unknown,
}

/// Direct media URLs resolved by the RapidAPI downloader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaBundle {
    pub kind: BundleKind,
    pub media_urls: Vec<String>,
    pub thumbnail: Option<String>,
    pub caption: Option<String>,
    pub username: Option<String>,
}

impl MediaBundle {
    pub fn empty() -> Self {
        Self {
            kind: BundleKind::Unknown,
            media_urls: Vec::new(),
            thumbnail: None,
            caption: None,
            username: None,
        }
    }
}

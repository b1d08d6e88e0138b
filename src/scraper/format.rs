//! Reshaping of raw scraper responses into [`crate::instagram::models`] types.
//!
//! Scraper payloads are loosely typed: fields go missing, come back as empty
//! strings, or switch between numbers and strings. A field counts as present
//! only when it is "truthy" (non-null, non-empty string, non-zero number,
//! `true`, or any array/object); absent fields fall back to defaults.

use serde_json::Value;

use crate::core::config::limits;
use crate::core::utils::truncate_chars;
use crate::instagram::models::{
    BundleKind, CarouselItem, MediaBundle, MediaType, Post, Profile, RecentPost, Reel, Story,
};

const BAN_STATUSES: &[&str] = &["banned", "disabled", "suspended"];

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| truthy(v))
}

/// Non-empty string field.
fn text(value: &Value, key: &str) -> Option<String> {
    field(value, key).and_then(Value::as_str).map(str::to_string)
}

/// String or number field rendered as a string.
fn scalar(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flag(value: &Value, key: &str) -> bool {
    value.get(key).map(truthy).unwrap_or(false)
}

/// Non-negative counter; missing, zero or malformed values become 0.
fn count(value: &Value, key: &str) -> u64 {
    match value.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.replace(',', "").trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn int(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_item(value: &Value) -> Option<&Value> {
    value.as_array().and_then(|items| items.first())
}

/// Strings, or objects carrying a `username`/`name`, from an array field.
fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(_) => text(item, "username").or_else(|| text(item, "name")),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

// ==================== Profile ====================

/// Builds a [`Profile`] from the first dataset item of the profile actor.
///
/// An absent or empty object yields [`fallback_profile`].
pub fn format_profile(data: &Value, username: &str) -> Profile {
    let is_empty = match data {
        Value::Object(map) => map.is_empty(),
        _ => true,
    };
    if is_empty {
        return fallback_profile(username);
    }

    let is_banned = detect_ban_status(data);
    Profile {
        username: text(data, "username").unwrap_or_else(|| username.to_string()),
        full_name: text(data, "fullName").unwrap_or_else(|| "N/A".to_string()),
        biography: text(data, "biography").unwrap_or_else(|| "No bio".to_string()),
        followers_count: count(data, "followersCount"),
        follows_count: count(data, "followsCount"),
        posts_count: count(data, "postsCount"),
        is_private: flag(data, "private"),
        is_verified: flag(data, "verified"),
        is_banned,
        ban_reason: is_banned.then(|| ban_reason(data)),
        profile_pic_url: text(data, "profilePicUrl"),
        hd_profile_pic_url: text(data, "hdProfilePicUrl"),
        external_url: text(data, "external_url"),
        is_business_account: flag(data, "isBusinessAccount"),
        recent_posts: recent_posts(data),
        error: None,
    }
}

fn recent_posts(data: &Value) -> Vec<RecentPost> {
    let Some(posts) = field(data, "latestPosts").and_then(Value::as_array) else {
        return Vec::new();
    };
    posts
        .iter()
        .take(limits::RECENT_POSTS_KEPT)
        .map(|post| {
            let short_code = text(post, "shortCode");
            RecentPost {
                url: format!("https://instagram.com/p/{}", short_code.as_deref().unwrap_or_default()),
                short_code,
                caption: truncate_chars(
                    &text(post, "caption").unwrap_or_default(),
                    limits::RECENT_POST_CAPTION_CHARS,
                ),
                likes_count: count(post, "likesCount"),
                comments_count: count(post, "commentsCount"),
                timestamp: scalar(post, "timestamp"),
                media_type: scalar(post, "mediaType"),
                is_video: flag(post, "is_video"),
            }
        })
        .collect()
}

/// True when the payload shows any sign of a banned or disabled account.
pub fn detect_ban_status(data: &Value) -> bool {
    if data.get("isBanned") == Some(&Value::Bool(true)) {
        return true;
    }
    if let Some(status) = data.get("accountStatus").and_then(Value::as_str) {
        if BAN_STATUSES.contains(&status) {
            return true;
        }
    }
    if let Some(error) = data.get("error").and_then(Value::as_str) {
        if error.contains("banned") || error.contains("disabled") {
            return true;
        }
    }
    !flag(data, "username") && !flag(data, "fullName") && flag(data, "error")
}

pub fn ban_reason(data: &Value) -> String {
    if let Some(reason) = text(data, "banReason") {
        return reason;
    }
    if let Some(error) = text(data, "error") {
        return error;
    }
    match data.get("accountStatus").and_then(Value::as_str) {
        Some("banned") => "Account banned by Instagram".to_string(),
        Some("disabled") => "Account disabled".to_string(),
        Some("suspended") => "Account suspended".to_string(),
        _ => "Account may be banned or restricted".to_string(),
    }
}

/// Placeholder profile used when the scraper returns nothing usable.
pub fn fallback_profile(username: &str) -> Profile {
    Profile {
        username: username.to_string(),
        full_name: "Unknown".to_string(),
        biography: "Could not fetch profile".to_string(),
        followers_count: 0,
        follows_count: 0,
        posts_count: 0,
        is_private: false,
        is_verified: false,
        is_banned: false,
        ban_reason: None,
        profile_pic_url: None,
        hd_profile_pic_url: None,
        external_url: None,
        is_business_account: false,
        recent_posts: Vec::new(),
        error: Some("Profile may be private, banned, or does not exist".to_string()),
    }
}

// ==================== Stories ====================

/// Flattens `[{stories: [...]}, ...]` from the story viewer actor.
pub fn format_stories(data: &Value) -> Vec<Story> {
    let Some(items) = data.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| item.get("stories").and_then(Value::as_array))
        .flatten()
        .map(|story| Story {
            id: scalar(story, "id"),
            taken_at: int(story, "taken_at"),
            expires_at: int(story, "expires_at"),
            media_type: story.get("media_type").and_then(MediaType::from_value),
            media_url: text(story, "video_url").or_else(|| text(story, "image_url")),
            thumbnail_url: text(story, "thumbnail_url"),
            dimensions: story.get("dimensions").filter(|v| !v.is_null()).cloned(),
            mentions: string_list(story, "mentions"),
            hashtags: string_list(story, "hashtags"),
            music: field(story, "music_info").cloned(),
        })
        .collect()
}

// ==================== Reel / Post ====================

pub fn format_reel(data: &Value) -> Option<Reel> {
    let reel = first_item(data)?;
    let short_code = text(reel, "shortcode");
    Some(Reel {
        id: scalar(reel, "id"),
        url: format!("https://instagram.com/reel/{}", short_code.as_deref().unwrap_or_default()),
        short_code,
        video_url: text(reel, "video_url"),
        thumbnail_url: text(reel, "thumbnail_url"),
        caption: text(reel, "caption"),
        likes_count: count(reel, "likes_count"),
        comments_count: count(reel, "comments_count"),
        play_count: count(reel, "play_count"),
        timestamp: scalar(reel, "timestamp"),
        duration: field(reel, "video_duration").and_then(Value::as_f64),
        owner_username: text(reel, "owner_username"),
        owner_full_name: text(reel, "owner_full_name"),
        is_verified: flag(reel, "owner_verified"),
        music: field(reel, "music_info").cloned(),
    })
}

pub fn format_post(data: &Value) -> Option<Post> {
    let post = first_item(data)?;
    let short_code = text(post, "shortcode");
    let media_type = post.get("media_type").and_then(MediaType::from_value);

    let media_urls = match field(post, "media_urls").and_then(Value::as_array) {
        Some(urls) => urls.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        None => text(post, "media_url").into_iter().collect(),
    };

    let carousel_items = post
        .get("carousel_media")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| CarouselItem {
                    is_video: flag(item, "is_video"),
                    video_url: text(item, "video_url"),
                    image_url: text(item, "image_url"),
                })
                .collect()
        })
        .unwrap_or_default();

    Some(Post {
        id: scalar(post, "id"),
        url: format!("https://instagram.com/p/{}", short_code.as_deref().unwrap_or_default()),
        short_code,
        media_type,
        media_urls,
        thumbnail_url: text(post, "thumbnail_url"),
        caption: text(post, "caption"),
        likes_count: count(post, "likes_count"),
        comments_count: count(post, "comments_count"),
        timestamp: scalar(post, "timestamp"),
        owner_username: text(post, "owner_username"),
        owner_full_name: text(post, "owner_full_name"),
        is_verified: flag(post, "owner_verified"),
        location: text(post, "location_name"),
        is_carousel: media_type == Some(MediaType::Carousel),
        carousel_items,
    })
}

// ==================== RapidAPI ====================

/// Normalizes the RapidAPI downloader's several response shapes.
///
/// Checked in order: `video`, non-empty `images`, `video_versions`,
/// `image_versions_url`, `carousel_media`. Anything else is `Unknown` with no URLs.
pub fn format_media_bundle(data: &Value) -> MediaBundle {
    let mut bundle = MediaBundle::empty();
    let user_username = data.get("user").and_then(|u| text(u, "username"));

    if let Some(video) = text(data, "video") {
        bundle.kind = BundleKind::Video;
        bundle.media_urls.push(video);
        bundle.thumbnail = text(data, "thumbnail").or_else(|| text(data, "video_thumb"));
        bundle.caption = text(data, "caption").or_else(|| text(data, "title"));
        bundle.username = text(data, "username").or_else(|| text(data, "owner_username"));
    } else if let Some(images) = data.get("images").and_then(Value::as_array).filter(|a| !a.is_empty()) {
        bundle.kind = BundleKind::Image;
        bundle.media_urls = images.iter().filter_map(Value::as_str).map(str::to_string).collect();
        bundle.caption = text(data, "caption").or_else(|| text(data, "title"));
        bundle.username = text(data, "username").or_else(|| text(data, "owner_username"));
    } else if let Some(versions) = field(data, "video_versions").and_then(Value::as_array) {
        bundle.kind = BundleKind::Video;
        bundle.media_urls = versions.iter().filter_map(|v| text(v, "url")).collect();
        bundle.thumbnail = text(data, "image_versions_url");
        bundle.caption = text(data, "caption");
        bundle.username = user_username;
    } else if let Some(image) = text(data, "image_versions_url") {
        bundle.kind = BundleKind::Image;
        bundle.media_urls.push(image);
        bundle.caption = text(data, "caption");
        bundle.username = user_username;
    } else if let Some(items) = field(data, "carousel_media").and_then(Value::as_array) {
        bundle.kind = BundleKind::Carousel;
        bundle.media_urls = items
            .iter()
            .filter_map(|item| match field(item, "video_versions").and_then(Value::as_array) {
                Some(versions) => versions.first().and_then(|v| text(v, "url")),
                None => text(item, "image_versions_url"),
            })
            .collect();
        bundle.caption = text(data, "caption");
        bundle.username = user_username;
    }

    bundle
}

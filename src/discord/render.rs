//! Plain-text message rendering.
//!
//! Every function returns message content ready for `say`/`edit`. Output is
//! clipped to Discord's message length limit by [`clip`].

use chrono::DateTime;

use crate::core::config::limits;
use crate::core::stats::BotStats;
use crate::core::utils::{bytes_to_mb, format_count, truncate_chars};
use crate::download::media::MediaKind;
use crate::instagram::models::{Post, Profile, Reel, Story};
use crate::instagram::url::InstagramLink;

const FOOTER: &str = "-# instarelay";

/// Cuts `text` to the Discord message limit, marking the cut.
pub fn clip(text: &str) -> String {
    if text.chars().count() <= limits::DISCORD_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut out = truncate_chars(text, limits::DISCORD_MESSAGE_CHARS - 1);
    out.push('…');
    out
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn caption_preview(caption: Option<&str>) -> String {
    match caption {
        Some(c) if !c.is_empty() => truncate_chars(c, limits::CAPTION_PREVIEW_CHARS),
        _ => "No caption".to_string(),
    }
}

/// Unix seconds as `YYYY-MM-DD HH:MM UTC`.
pub fn format_unix(secs: Option<i64>) -> String {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

// ==================== Command status lines ====================

pub fn fetching_profile(username: &str) -> String {
    format!("🔍 Fetching profile for @{}...", username)
}

pub fn fetching_stories(username: &str) -> String {
    format!("📖 Fetching stories for @{}...", username)
}

pub fn fetching_reel() -> String {
    "🎬 Fetching reel...".to_string()
}

pub fn fetching_post() -> String {
    "📸 Fetching post...".to_string()
}

pub fn not_configured() -> String {
    "⚠️ Instagram lookups are not configured on this bot (APIFY_TOKEN is missing).".to_string()
}

pub fn media_send_failed() -> String {
    "❌ Failed to download media file.".to_string()
}

// ==================== Help / stats ====================

pub fn help(prefix: &str) -> String {
    let p = prefix;
    format!(
        "**🤖 Instagram Bot Commands**\n\
         Here are all available commands:\n\
         `{p}help` - Show this help menu\n\
         `{p}profile <username>` - Get Instagram profile details with ban check\n\
         `{p}stories <username>` - Get active Instagram stories\n\
         `{p}reel <url>` - Download Instagram reel\n\
         `{p}post <url>` - Download Instagram post\n\
         `{p}stats` - Show bot statistics\n\
         Paste any Instagram link in the relay channel to get the media.\n\
         {FOOTER}"
    )
}

pub fn stats(bot_name: &str, stats: &BotStats, command_count: usize) -> String {
    format!(
        "**📊 Bot Statistics**\n\
         🤖 Bot: {}\n\
         📅 Uptime: {}\n\
         🔄 Version: {}\n\
         📌 Servers: {}\n\
         ⚡ Commands: {}\n\
         📥 Links relayed: {}\n\
         ❌ Failed downloads: {}\n\
         {FOOTER}",
        bot_name,
        stats.uptime_string(),
        env!("CARGO_PKG_VERSION"),
        stats.guilds(),
        command_count,
        format_count(stats.links_relayed()),
        format_count(stats.downloads_failed()),
    )
}

// ==================== Profile ====================

pub fn profile(profile: &Profile) -> String {
    let mut out = format!("**📊 Instagram Profile: @{}**\n", profile.username);
    out.push_str(&format!("{}\n", profile.biography));
    out.push_str(&format!(
        "👤 Full Name: {} | 🔒 Private: {} | ✅ Verified: {}\n",
        profile.full_name,
        yes_no(profile.is_private),
        yes_no(profile.is_verified)
    ));
    out.push_str(&format!(
        "📊 Followers: {} | 👥 Following: {} | 📸 Posts: {}\n",
        format_count(profile.followers_count),
        format_count(profile.follows_count),
        format_count(profile.posts_count)
    ));
    if let Some(url) = &profile.external_url {
        out.push_str(&format!("🔗 {}\n", url));
    }

    if profile.is_banned {
        out.push_str(&format!(
            "⚠️ **BAN DETECTED**: {}\n",
            profile
                .ban_reason
                .as_deref()
                .unwrap_or("Account may be banned or restricted")
        ));
    }

    if !profile.recent_posts.is_empty() {
        out.push_str("📌 Recent Posts:\n");
        for post in profile.recent_posts.iter().take(limits::RECENT_POSTS_SHOWN) {
            out.push_str(&format!(
                "[{}](<{}>) - ❤️ {} | 💬 {}\n",
                post.short_code.as_deref().unwrap_or("post"),
                post.url,
                post.likes_count,
                post.comments_count
            ));
        }
    }

    if let Some(error) = &profile.error {
        out.push_str(&format!("⚠️ Error: {}\n", error));
    }
    out.push_str(FOOTER);
    clip(&out)
}

// ==================== Stories ====================

pub fn no_stories(username: &str) -> String {
    format!("**📖 Stories for @{}**\nNo active stories found", username)
}

pub fn stories_summary(username: &str, count: usize) -> String {
    format!("**📖 Stories for @{}**\nFound **{}** active stories", username, count)
}

pub fn story(index: usize, story: &Story) -> String {
    let is_video = story.is_video();
    let mut out = format!(
        "**Story #{}** | 📱 {}\n📅 Taken: {} | ⏰ Expires: {}",
        index,
        if is_video { "Video" } else { "Image" },
        format_unix(story.taken_at),
        format_unix(story.expires_at)
    );
    if !story.mentions.is_empty() {
        out.push_str(&format!("\n👥 Mentions: {}", story.mentions.join(", ")));
    }
    // Images are shown by Discord's link preview; videos are attached separately.
    if !is_video {
        if let Some(url) = &story.media_url {
            out.push('\n');
            out.push_str(url);
        }
    }
    clip(&out)
}

pub fn stories_truncated(shown: usize, total: usize) -> String {
    format!("📌 Note: Showing first {} of {} stories", shown, total)
}

// ==================== Reel / Post ====================

pub fn reel_not_found() -> String {
    "**❌ Reel Not Found**\nCould not fetch reel data. Make sure the URL is valid.".to_string()
}

pub fn post_not_found() -> String {
    "**❌ Post Not Found**\nCould not fetch post data. Make sure the URL is valid.".to_string()
}

fn owner_line(username: Option<&str>, verified: bool) -> String {
    format!(
        "@{}{}",
        username.unwrap_or("unknown"),
        if verified { " ✅" } else { "" }
    )
}

pub fn reel(reel: &Reel) -> String {
    let duration = reel
        .duration
        .map(|d| format!("{}s", d))
        .unwrap_or_else(|| "N/A".to_string());
    let out = format!(
        "**🎬 Instagram Reel by {}**\n<{}>\n{}\n❤️ Likes: {} | 💬 Comments: {} | ▶️ Plays: {} | ⏱️ Duration: {}\n{FOOTER}",
        owner_line(reel.owner_username.as_deref(), reel.is_verified),
        reel.url,
        caption_preview(reel.caption.as_deref()),
        format_count(reel.likes_count),
        format_count(reel.comments_count),
        format_count(reel.play_count),
        duration,
    );
    clip(&out)
}

pub fn post(post: &Post) -> String {
    let title = if post.is_carousel {
        "📸 Instagram Carousel"
    } else if post.is_video() {
        "🎥 Instagram Video"
    } else {
        "📷 Instagram Photo"
    };
    let mut out = format!(
        "**{}**\n<{}>\n{}\n👤 Owner: {} | ❤️ Likes: {} | 💬 Comments: {}",
        title,
        post.url,
        caption_preview(post.caption.as_deref()),
        owner_line(post.owner_username.as_deref(), post.is_verified),
        format_count(post.likes_count),
        format_count(post.comments_count),
    );
    if let Some(location) = &post.location {
        out.push_str(&format!(" | 📍 {}", location));
    }
    out.push('\n');
    out.push_str(FOOTER);
    clip(&out)
}

// ==================== Link relay ====================

/// Names the link kind (post, reel, story) when the URL can be classified.
pub fn relay_processing(url: &str) -> String {
    let kind = InstagramLink::parse(url).map_or("link", |link| link.kind_label());
    format!("📥 Processing Instagram {}...\n{}", kind, url)
}

pub fn relay_failed(url: &str, reason: &str) -> String {
    format!("❌ Failed to download.\n{}\n{}", reason, url)
}

pub fn relay_too_large(url: &str, size_bytes: u64, limit_bytes: u64) -> String {
    format!(
        "⚠️ File is too large for Discord ({:.2}MB > {:.0}MB limit).\n{}",
        bytes_to_mb(size_bytes),
        bytes_to_mb(limit_bytes),
        url
    )
}

pub fn relay_success(requester: &str, kind: MediaKind, size_bytes: u64, url: &str) -> String {
    format!(
        "**📥 Instagram Downloader**\nDownloaded for {}\n📱 Type: {} | 📦 Size: {:.2} MB | 🔗 <{}>",
        requester,
        kind.label(),
        bytes_to_mb(size_bytes),
        url
    )
}

pub fn relay_upload_failed(error: &str) -> String {
    format!("❌ Failed to send file. Error: {}", error)
}

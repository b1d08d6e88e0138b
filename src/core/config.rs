use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

use crate::core::error::AppError;

/// Reads an env var, treating empty / whitespace-only values as unset.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Parses a Discord channel snowflake. Zero is not a valid snowflake.
pub fn parse_channel_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|id| *id != 0)
}

/// Discord bot token
/// Read from DISCORD_BOT_TOKEN environment variable
pub static DISCORD_BOT_TOKEN: Lazy<String> =
    Lazy::new(|| non_empty_var("DISCORD_BOT_TOKEN").unwrap_or_default());

/// Channel the link relay listens to
/// Read from DISCORD_CHANNEL_ID environment variable
pub static DISCORD_CHANNEL_ID: Lazy<Option<u64>> =
    Lazy::new(|| non_empty_var("DISCORD_CHANNEL_ID").and_then(|raw| parse_channel_id(&raw)));

/// Prefix for text commands (`!profile`, `!reel`, ...)
/// Read from COMMAND_PREFIX environment variable
/// Default: "!"
pub static COMMAND_PREFIX: Lazy<String> =
    Lazy::new(|| non_empty_var("COMMAND_PREFIX").unwrap_or_else(|| "!".to_string()));

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| non_empty_var("YTDL_BIN").unwrap_or_else(|| "yt-dlp".to_string()));

/// Scratch directory for downloaded media
/// Read from DOWNLOAD_DIR environment variable
/// Default: /tmp/instagram-downloads
pub static DOWNLOAD_DIR: Lazy<String> =
    Lazy::new(|| non_empty_var("DOWNLOAD_DIR").unwrap_or_else(|| "/tmp/instagram-downloads".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: instarelay.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| non_empty_var("LOG_FILE_PATH").unwrap_or_else(|| "instarelay.log".to_string()));

/// Log level: error, warn, info, debug, trace
/// Read from LOG_LEVEL environment variable
/// Default: info
pub static LOG_LEVEL: Lazy<String> =
    Lazy::new(|| non_empty_var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()).to_lowercase());

/// Apify API token. Profile/stories/reel/post commands are disabled without it.
pub static APIFY_TOKEN: Lazy<Option<String>> = Lazy::new(|| non_empty_var("APIFY_TOKEN"));

/// Apify API base URL
/// Read from APIFY_BASE_URL environment variable
pub static APIFY_BASE_URL: Lazy<String> =
    Lazy::new(|| non_empty_var("APIFY_BASE_URL").unwrap_or_else(|| "https://api.apify.com/v2".to_string()));

/// RapidAPI key for the Instagram downloader endpoint. Used as a fallback
/// media source when yt-dlp fails.
pub static RAPIDAPI_KEY: Lazy<Option<String>> = Lazy::new(|| non_empty_var("RAPIDAPI_KEY"));

/// RapidAPI host header value
pub static RAPIDAPI_HOST: Lazy<String> = Lazy::new(|| {
    non_empty_var("RAPIDAPI_HOST")
        .unwrap_or_else(|| "instagram-downloader-download-instagram-videos-stories.p.rapidapi.com".to_string())
});

/// RapidAPI base URL
/// Read from RAPIDAPI_BASE_URL environment variable
/// Default: https://{RAPIDAPI_HOST}
pub static RAPIDAPI_BASE_URL: Lazy<String> =
    Lazy::new(|| non_empty_var("RAPIDAPI_BASE_URL").unwrap_or_else(|| format!("https://{}", *RAPIDAPI_HOST)));

/// Size and count limits for relayed content
pub mod limits {
    use once_cell::sync::Lazy;
    use std::env;

    /// Default Discord upload limit for non-boosted servers (MiB)
    pub const DEFAULT_MAX_UPLOAD_MB: u64 = 25;

    /// Maximum attachment size in bytes
    /// Read from DISCORD_MAX_UPLOAD_MB environment variable
    pub static MAX_UPLOAD_BYTES: Lazy<u64> =
        Lazy::new(|| upload_limit_bytes(env::var("DISCORD_MAX_UPLOAD_MB").ok().as_deref()));

    /// MiB setting to bytes. Unparsable, zero or overflowing values use the default.
    pub fn upload_limit_bytes(raw: Option<&str>) -> u64 {
        raw.and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v > 0)
            .and_then(|mb| mb.checked_mul(1024 * 1024))
            .unwrap_or(DEFAULT_MAX_UPLOAD_MB * 1024 * 1024)
    }

    /// Stories sent per `stories` command
    pub const MAX_STORIES: usize = 5;

    /// Carousel items sent per `post` command
    pub const MAX_CAROUSEL_ITEMS: usize = 5;

    /// Recent posts kept when reshaping a profile
    pub const RECENT_POSTS_KEPT: usize = 5;

    /// Recent posts shown on a profile card
    pub const RECENT_POSTS_SHOWN: usize = 3;

    /// Caption length for recent posts on a profile
    pub const RECENT_POST_CAPTION_CHARS: usize = 100;

    /// Caption preview length for reels and posts
    pub const CAPTION_PREVIEW_CHARS: usize = 200;

    /// Discord message content hard limit
    pub const DISCORD_MESSAGE_CHARS: usize = 2000;
}

/// Processed-message bookkeeping for the link relay
pub mod dedup {
    /// Remembered message IDs before truncation kicks in
    pub const CAPACITY: usize = 100;

    /// Oldest IDs dropped once capacity is exceeded
    pub const EVICT: usize = 20;
}

/// Download configuration
pub mod download {
    use super::Duration;

    /// Timeout for a single yt-dlp invocation (in seconds)
    pub const YTDLP_TIMEOUT_SECS: u64 = 180;

    /// Timeout for `yt-dlp --version`
    pub const VERSION_CHECK_TIMEOUT_SECS: u64 = 15;

    /// Maximum number of concurrent downloads
    pub const MAX_CONCURRENT_DOWNLOADS: usize = 2;

    /// Primary yt-dlp format selector
    pub const PRIMARY_FORMAT: &str = "best[ext=mp4]/best";

    /// Format selector for the simplified second attempt
    pub const FALLBACK_FORMAT: &str = "best";

    /// Browser user agent passed to yt-dlp and media fetches
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

    /// yt-dlp command timeout duration
    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(YTDLP_TIMEOUT_SECS)
    }

    /// Version check timeout duration
    pub fn version_check_timeout() -> Duration {
        Duration::from_secs(VERSION_CHECK_TIMEOUT_SECS)
    }
}

/// Apify actor-run configuration
pub mod apify {
    use super::Duration;

    /// Server-side long-poll passed as `waitForFinish` when starting a run (seconds)
    pub const START_WAIT_SECS: u64 = 60;

    /// Server-side long-poll for each status check (seconds)
    pub const POLL_WAIT_SECS: u64 = 30;

    /// Client-side pause between status checks
    pub const POLL_INTERVAL_MS: u64 = 2000;

    /// Give up on a run after this long
    pub const MAX_RUN_WAIT_SECS: u64 = 300;

    pub const PROFILE_ACTOR: &str = "coderx~instagram-profile-scraper-api";
    pub const STORIES_ACTOR: &str = "igview-owner~instagram-story-viewer";
    pub const REEL_ACTOR: &str = "codenest~instagram-reels-downloader-scraper";
    pub const POST_ACTOR: &str = "igview-owner~instagram-video-downloader";

    pub fn poll_interval() -> Duration {
        Duration::from_millis(POLL_INTERVAL_MS)
    }

    pub fn max_run_wait() -> Duration {
        Duration::from_secs(MAX_RUN_WAIT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for scraper API calls (in seconds)
    /// Must exceed the Apify long-poll window
    pub const REQUEST_TIMEOUT_SECS: u64 = 120;

    /// Timeout for streaming a media file to disk (in seconds)
    pub const MEDIA_FETCH_TIMEOUT_SECS: u64 = 300;

    /// Connect timeout (in seconds)
    pub const CONNECT_TIMEOUT_SECS: u64 = 15;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }

    pub fn media_timeout() -> Duration {
        Duration::from_secs(MEDIA_FETCH_TIMEOUT_SECS)
    }

    pub fn connect_timeout() -> Duration {
        Duration::from_secs(CONNECT_TIMEOUT_SECS)
    }
}

/// Checks that everything the bot needs to connect is present.
///
/// Returns an error naming every missing variable at once.
pub fn validate_for_bot() -> Result<(), AppError> {
    let mut missing = Vec::new();
    if DISCORD_BOT_TOKEN.is_empty() {
        missing.push("DISCORD_BOT_TOKEN");
    }
    if DISCORD_CHANNEL_ID.is_none() {
        missing.push("DISCORD_CHANNEL_ID");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "missing or invalid environment variables: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_id() {
        assert_eq!(parse_channel_id("1234567890123"), Some(1234567890123));
        assert_eq!(parse_channel_id("  42 "), Some(42));
        assert_eq!(parse_channel_id("0"), None);
        assert_eq!(parse_channel_id("general"), None);
        assert_eq!(parse_channel_id(""), None);
    }

    #[test]
    fn test_upload_limit_bytes() {
        let default = limits::DEFAULT_MAX_UPLOAD_MB * 1024 * 1024;
        assert_eq!(limits::upload_limit_bytes(None), default);
        assert_eq!(limits::upload_limit_bytes(Some("50")), 50 * 1024 * 1024);
        assert_eq!(limits::upload_limit_bytes(Some("0")), default);
        assert_eq!(limits::upload_limit_bytes(Some("lots")), default);
        assert_eq!(limits::upload_limit_bytes(Some("18446744073709551")), default);
    }

    #[test]
    fn test_limits_are_consistent() {
        assert!(limits::RECENT_POSTS_SHOWN <= limits::RECENT_POSTS_KEPT);
        assert!(dedup::EVICT < dedup::CAPACITY);
        assert!(*limits::MAX_UPLOAD_BYTES >= 1024 * 1024);
    }

    #[test]
    fn test_apify_poll_fits_request_timeout() {
        assert!(apify::POLL_WAIT_SECS < network::REQUEST_TIMEOUT_SECS);
        assert!(apify::START_WAIT_SECS < network::REQUEST_TIMEOUT_SECS);
    }
}

//! Instagram link detection and classification.
//!
//! Recognized forms:
//! - `instagram.com/p/<code>`, `/reel/<code>`, `/reels/<code>`, `/tv/<code>`
//! - `instagram.com/<username>/p/<code>`, `instagram.com/<username>/reel/<code>`
//! - `instagram.com/stories/<username>/<id>` and `instagram.com/stories/<username>`
//! - the `instagr.am` short host for post/reel/tv links

use lazy_regex::regex;
use url::Url;

const CONTENT_TYPES: &[&str] = &["p", "reel", "reels", "tv"];

/// Paths under instagram.com that are never usernames.
const RESERVED_PATHS: &[&str] = &[
    "p",
    "reel",
    "reels",
    "tv",
    "stories",
    "explore",
    "accounts",
    "about",
    "legal",
    "developer",
    "directory",
    "api",
    "static",
    "favicon.ico",
];

/// Returns the first Instagram media link found in a chat message.
///
/// Query strings and trailing slashes are not part of the match.
///
/// # Example
///
/// ```
/// use instarelay::instagram::url::extract_instagram_url;
///
/// let text = "look at this https://www.instagram.com/reel/C1a2B3c4D5e/?igsh=abc";
/// assert_eq!(
///     extract_instagram_url(text).as_deref(),
///     Some("https://www.instagram.com/reel/C1a2B3c4D5e")
/// );
/// assert_eq!(extract_instagram_url("no links here"), None);
/// ```
pub fn extract_instagram_url(text: &str) -> Option<String> {
    let re = regex!(
        r"https?://(?:www\.)?(?:instagram\.com/stories/[A-Za-z0-9_.]+/[0-9]+|instagram\.com/[A-Za-z0-9_.]+/(?:p|reel)/[A-Za-z0-9_-]+|(?:instagram\.com|instagr\.am)/(?:p|reel|reels|tv|stories)/[A-Za-z0-9_.-]+)"
    );
    re.find(text).map(|m| m.as_str().to_string())
}

/// A classified Instagram media link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstagramLink {
    Post { shortcode: String },
    Reel { shortcode: String },
    Tv { shortcode: String },
    Story { username: String, story_id: Option<String> },
}

impl InstagramLink {
    /// Classifies an Instagram URL. Returns `None` for profiles and foreign hosts.
    pub fn parse(raw: &str) -> Option<Self> {
        let url = Url::parse(raw).ok()?;
        if !is_instagram_host(&url) {
            return None;
        }
        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["stories", username, rest @ ..] => Some(InstagramLink::Story {
                username: (*username).to_string(),
                story_id: rest.first().map(|s| (*s).to_string()),
            }),
            [kind, code, ..] if CONTENT_TYPES.contains(kind) => Some(Self::content(kind, code)),
            [_user, kind, code, ..] if CONTENT_TYPES.contains(kind) => Some(Self::content(kind, code)),
            _ => None,
        }
    }

    fn content(kind: &str, code: &str) -> Self {
        let shortcode = code.to_string();
        match kind {
            "reel" | "reels" => InstagramLink::Reel { shortcode },
            "tv" => InstagramLink::Tv { shortcode },
            _ => InstagramLink::Post { shortcode },
        }
    }

    /// Human-readable kind, used in status messages.
    pub fn kind_label(&self) -> &'static str {
        match self {
            InstagramLink::Post { .. } => "post",
            InstagramLink::Reel { .. } => "reel",
            InstagramLink::Tv { .. } => "video",
            InstagramLink::Story { .. } => "story",
        }
    }

    pub fn shortcode(&self) -> Option<&str> {
        match self {
            InstagramLink::Post { shortcode } | InstagramLink::Reel { shortcode } | InstagramLink::Tv { shortcode } => {
                Some(shortcode)
            }
            InstagramLink::Story { .. } => None,
        }
    }
}

fn is_instagram_host(url: &Url) -> bool {
    matches!(
        url.host_str().map(|h| h.to_lowercase()).as_deref(),
        Some("instagram.com" | "www.instagram.com" | "instagr.am" | "www.instagr.am")
    )
}

/// Check if URL is an Instagram profile URL (e.g., `instagram.com/username`).
///
/// Returns the username if it matches, excluding reserved paths.
pub fn extract_profile_username(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.to_lowercase();
    if host != "instagram.com" && host != "www.instagram.com" {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    if segments.len() != 1 {
        return None;
    }

    let username = segments[0];
    if RESERVED_PATHS.contains(&username) {
        return None;
    }

    if is_valid_username(username) {
        Some(username.to_string())
    } else {
        None
    }
}

/// Instagram usernames: 1-30 chars of ASCII letters, digits, dots and underscores.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= 30
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}

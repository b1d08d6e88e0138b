//! Classification of yt-dlp failures from its stderr output.
//!
//! The relay uses the classification to decide whether a fallback attempt
//! is worth it and which message to show in the channel.

/// Types of yt-dlp errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YtDlpErrorType {
    /// Instagram wants a logged-in session (private account, age gate)
    LoginRequired,
    /// Media was removed or the link is wrong
    NotFound,
    /// Instagram throttled the request
    RateLimited,
    /// Timeouts, DNS, connection resets
    NetworkError,
    /// Anything else
    Unknown,
}

/// Analyzes yt-dlp stderr and determines the error type
pub fn analyze_ytdlp_error(stderr: &str) -> YtDlpErrorType {
    let stderr_lower = stderr.to_lowercase();

    if stderr_lower.contains("login required")
        || stderr_lower.contains("log in")
        || stderr_lower.contains("login_required")
        || stderr_lower.contains("private")
        || stderr_lower.contains("use --cookies")
        || stderr_lower.contains("requested content is not available")
    {
        return YtDlpErrorType::LoginRequired;
    }

    if stderr_lower.contains("http error 404")
        || stderr_lower.contains("not found")
        || stderr_lower.contains("does not exist")
        || stderr_lower.contains("has been removed")
        || stderr_lower.contains("unsupported url")
    {
        return YtDlpErrorType::NotFound;
    }

    if stderr_lower.contains("http error 429")
        || stderr_lower.contains("rate-limit")
        || stderr_lower.contains("rate limit")
        || stderr_lower.contains("too many requests")
    {
        return YtDlpErrorType::RateLimited;
    }

    if stderr_lower.contains("timed out")
        || stderr_lower.contains("timeout")
        || stderr_lower.contains("connection")
        || stderr_lower.contains("network")
        || stderr_lower.contains("socket")
        || stderr_lower.contains("name resolution")
        || stderr_lower.contains("failed to connect")
    {
        return YtDlpErrorType::NetworkError;
    }

    YtDlpErrorType::Unknown
}

impl YtDlpErrorType {
    /// A second attempt with a different format cannot fix these.
    pub fn is_permanent(&self) -> bool {
        matches!(self, YtDlpErrorType::LoginRequired | YtDlpErrorType::NotFound)
    }

    /// Short explanation appended to the failure status message.
    pub fn user_message(&self) -> &'static str {
        match self {
            YtDlpErrorType::LoginRequired => "The post is private or requires login.",
            YtDlpErrorType::NotFound => "The post was not found. It may have been deleted.",
            YtDlpErrorType::RateLimited => "Instagram is rate limiting requests. Try again in a few minutes.",
            YtDlpErrorType::NetworkError => "Network problem while contacting Instagram. Try again shortly.",
            YtDlpErrorType::Unknown => "The link might be private or unsupported.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            YtDlpErrorType::LoginRequired => "login_required",
            YtDlpErrorType::NotFound => "not_found",
            YtDlpErrorType::RateLimited => "rate_limited",
            YtDlpErrorType::NetworkError => "network",
            YtDlpErrorType::Unknown => "unknown",
        }
    }
}

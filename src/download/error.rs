use std::fmt;

/// Structured error type for media download operations.
///
/// Each variant carries a human-readable message; `subcategory()` gives the
/// short label used in log lines.
#[derive(Debug)]
pub enum DownloadError {
    /// yt-dlp specific failures (bad exit code, extractor errors)
    YtDlp(String),
    /// Expected file not found after the download finished
    FileNotFound(String),
    /// Download timed out
    Timeout(String),
    /// Process execution failure (spawn, missing binary)
    Process(String),
    /// Downloaded media exceeds the Discord upload limit
    TooLarge { size_bytes: u64, limit_bytes: u64 },
    /// Direct media fetch failed (network or non-2xx status)
    Http(String),
    /// Filesystem failure while writing or inspecting media
    Io(String),
    /// No source could handle the link
    Unsupported(String),
    /// Catch-all for uncategorized errors
    Other(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::TooLarge {
                size_bytes,
                limit_bytes,
            } => write!(
                f,
                "file is {:.1} MB, over the {:.0} MB upload limit",
                crate::core::utils::bytes_to_mb(*size_bytes),
                crate::core::utils::bytes_to_mb(*limit_bytes)
            ),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for DownloadError {}

impl DownloadError {
    /// Returns subcategory for log lines
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::YtDlp(_) => "ytdlp",
            DownloadError::FileNotFound(_) => "file_not_found",
            DownloadError::Timeout(_) => "timeout",
            DownloadError::Process(_) => "process",
            DownloadError::TooLarge { .. } => "too_large",
            DownloadError::Http(_) => "http",
            DownloadError::Io(_) => "io",
            DownloadError::Unsupported(_) => "unsupported",
            DownloadError::Other(_) => "other",
        }
    }

    /// Returns the inner message (empty for `TooLarge`, which formats its sizes)
    pub fn message(&self) -> &str {
        match self {
            DownloadError::YtDlp(msg)
            | DownloadError::FileNotFound(msg)
            | DownloadError::Timeout(msg)
            | DownloadError::Process(msg)
            | DownloadError::Http(msg)
            | DownloadError::Io(msg)
            | DownloadError::Unsupported(msg)
            | DownloadError::Other(msg) => msg,
            DownloadError::TooLarge { .. } => "",
        }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(e: std::io::Error) -> Self {
        DownloadError::Io(e.to_string())
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        DownloadError::Http(e.to_string())
    }
}

impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        DownloadError::Other(s)
    }
}

impl From<&str> for DownloadError {
    fn from(s: &str) -> Self {
        DownloadError::Other(s.to_string())
    }
}

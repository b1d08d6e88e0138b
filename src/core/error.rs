use thiserror::Error;

use crate::download::error::DownloadError;
use crate::scraper::error::ScraperError;

/// Centralized error types for the application
///
/// Layer-specific errors (`DownloadError`, `ScraperError`) are wrapped here so the
/// Discord handlers and the CLI deal with a single type.
///
/// # Example
///
/// ```no_run
/// use instarelay::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Discord gateway / REST errors
    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),

    /// Download/yt-dlp errors
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// Scraper API errors (Apify, RapidAPI)
    #[error("Scraper error: {0}")]
    Scraper(#[from] ScraperError),

    /// HTTP/Fetch errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Short category label, used in log lines.
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Discord(_) => "discord",
            AppError::Download(e) => e.subcategory(),
            AppError::Scraper(_) => "scraper",
            AppError::Http(_) => "http",
            AppError::Io(_) => "io",
            AppError::Config(_) => "config",
            AppError::Validation(_) => "validation",
            AppError::Anyhow(_) => "other",
        }
    }
}

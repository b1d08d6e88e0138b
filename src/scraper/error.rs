use thiserror::Error;

use crate::core::retry::Retryable;

/// Errors from the scraping APIs (Apify actors, RapidAPI downloader).
#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("actor run {run_id} finished with status {status}")]
    RunFailed { run_id: String, status: String },

    #[error("actor run {run_id} did not finish within {waited_secs}s")]
    RunTimeout { run_id: String, waited_secs: u64 },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl Retryable for ScraperError {
    fn is_retryable(&self) -> bool {
        match self {
            ScraperError::Http(e) => e.is_retryable(),
            ScraperError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

//! RapidAPI Instagram downloader client.
//!
//! Resolves a post/reel link into direct CDN media URLs. Used as the fallback
//! media source when yt-dlp cannot fetch a link.

use serde_json::Value;

use crate::core::config;
use crate::core::retry::{retry, RetryConfig};
use crate::instagram::models::MediaBundle;
use crate::scraper::error::ScraperError;
use crate::scraper::format::format_media_bundle;

pub struct RapidApiClient {
    http: reqwest::Client,
    base_url: String,
    host: String,
    key: String,
    retry: RetryConfig,
}

impl RapidApiClient {
    pub fn new(
        base_url: impl Into<String>,
        host: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, ScraperError> {
        let http = reqwest::Client::builder()
            .timeout(config::network::timeout())
            .connect_timeout(config::network::connect_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            host: host.into(),
            key: key.into(),
            retry: RetryConfig::quick(),
        })
    }

    /// Client from `RAPIDAPI_KEY` / `RAPIDAPI_HOST` / `RAPIDAPI_BASE_URL`.
    pub fn from_env() -> Result<Self, ScraperError> {
        let key = config::RAPIDAPI_KEY
            .clone()
            .ok_or(ScraperError::NotConfigured("RAPIDAPI_KEY"))?;
        Self::new(config::RAPIDAPI_BASE_URL.as_str(), config::RAPIDAPI_HOST.as_str(), key)
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub async fn media(&self, url: &str) -> Result<MediaBundle, ScraperError> {
        log::info!("Resolving media via RapidAPI: {}", url);
        let endpoint = format!("{}/index", self.base_url);

        let body: Value = retry(&self.retry, "rapidapi index", || {
            let request = self
                .http
                .get(&endpoint)
                .query(&[("url", url)])
                .header("X-RapidAPI-Key", &self.key)
                .header("X-RapidAPI-Host", &self.host);
            async move {
                let resp = request.send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(ScraperError::Status {
                        endpoint: "index".to_string(),
                        status: status.as_u16(),
                    });
                }
                Ok(resp.json::<Value>().await?)
            }
        })
        .await?;

        let bundle = format_media_bundle(&body);
        log::debug!("RapidAPI returned {} media URL(s) ({:?})", bundle.media_urls.len(), bundle.kind);
        Ok(bundle)
    }
}

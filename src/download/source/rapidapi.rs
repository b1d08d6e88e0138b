use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::config;
use crate::download::error::DownloadError;
use crate::download::fetch::{extension_from_url, fetch_to_file};
use crate::download::media::{new_token, resolve_title, MediaFile, MediaKind};
use crate::download::source::MediaSource;
use crate::instagram::models::BundleKind;
use crate::scraper::service::InstagramService;

/// Media source that resolves CDN URLs through RapidAPI and streams the first one.
pub struct RapidApiSource {
    service: Arc<InstagramService>,
    http: reqwest::Client,
    output_dir: PathBuf,
    max_bytes: u64,
}

impl RapidApiSource {
    pub fn new(service: Arc<InstagramService>, output_dir: PathBuf, max_bytes: u64) -> Result<Self, DownloadError> {
        let http = reqwest::Client::builder()
            .user_agent(config::download::USER_AGENT)
            .timeout(config::network::media_timeout())
            .connect_timeout(config::network::connect_timeout())
            .build()?;
        Ok(Self {
            service,
            http,
            output_dir,
            max_bytes,
        })
    }
}

#[async_trait]
impl MediaSource for RapidApiSource {
    fn name(&self) -> &str {
        "rapidapi"
    }

    async fn fetch(&self, url: &str) -> Result<MediaFile, DownloadError> {
        let bundle = self
            .service
            .media(url)
            .await
            .ok_or_else(|| DownloadError::Unsupported(format!("RapidAPI could not resolve {}", url)))?;

        let media_url = bundle
            .media_urls
            .first()
            .ok_or_else(|| DownloadError::Unsupported(format!("RapidAPI returned no media for {}", url)))?;

        let default_ext = match bundle.kind {
            BundleKind::Image => "jpg",
            _ => "mp4",
        };
        let token = new_token();
        let file_name = format!("rapidapi_{}.{}", token, extension_from_url(media_url, default_ext));

        let fetched = fetch_to_file(&self.http, media_url, &self.output_dir, &file_name, self.max_bytes).await?;

        Ok(MediaFile {
            kind: MediaKind::from_path(&fetched.path),
            path: fetched.path,
            file_name,
            size_bytes: fetched.size_bytes,
            title: resolve_title(bundle.caption.as_deref(), bundle.username.as_deref()),
            uploader: bundle.username.clone(),
            description: bundle.caption.clone(),
            token,
        })
    }
}

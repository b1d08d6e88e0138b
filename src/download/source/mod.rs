//! Pluggable media sources for the link relay.
//!
//! A `MediaSource` turns an Instagram link into a local file. The relay uses a
//! `SourceChain`, which tries each source in order and returns the first success.
//!
//! Built-in sources:
//! - `YtDlpSource`: yt-dlp with the mp4-first / `-f best` fallback
//! - `RapidApiSource`: resolves CDN URLs through the RapidAPI downloader and streams the first one

pub mod rapidapi;
pub mod ytdlp;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::download::error::DownloadError;
use crate::download::media::MediaFile;
use crate::download::ytdlp::{YtDlpConfig, YtDlpDownloader};
use crate::scraper::service::InstagramService;

pub use rapidapi::RapidApiSource;
pub use ytdlp::YtDlpSource;

#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Human-readable name of this source (e.g., "yt-dlp", "rapidapi")
    fn name(&self) -> &str;

    /// Downloads the media behind `url` into the download directory.
    async fn fetch(&self, url: &str) -> Result<MediaFile, DownloadError>;
}

/// Ordered list of sources; the first success wins.
#[derive(Default)]
pub struct SourceChain {
    sources: Vec<Arc<dyn MediaSource>>,
}

impl SourceChain {
    pub fn new() -> Self {
        Self { sources: Vec::new() }
    }

    /// Register a source. Sources are tried in insertion order.
    pub fn register(&mut self, source: Arc<dyn MediaSource>) {
        self.sources.push(source);
    }

    pub fn with(mut self, source: Arc<dyn MediaSource>) -> Self {
        self.register(source);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// yt-dlp into `output_dir`, then RapidAPI when the service has a key for it.
pub fn default_chain(
    service: &Arc<InstagramService>,
    output_dir: PathBuf,
    max_bytes: u64,
) -> Result<SourceChain, DownloadError> {
    let ytdlp = YtDlpDownloader::new(YtDlpConfig {
        output_dir: output_dir.clone(),
        ..YtDlpConfig::default()
    });
    let mut chain = SourceChain::new().with(Arc::new(YtDlpSource::new(ytdlp)));
    if service.has_media_fallback() {
        chain.register(Arc::new(RapidApiSource::new(service.clone(), output_dir, max_bytes)?));
    }
    Ok(chain)
}

#[async_trait]
impl MediaSource for SourceChain {
    fn name(&self) -> &str {
        "chain"
    }

    /// Returns the first source's success. When all fail, a `TooLarge` from any
    /// source is returned so the channel sees the size limit; otherwise the
    /// first source's error (yt-dlp's private / not found classification).
    async fn fetch(&self, url: &str) -> Result<MediaFile, DownloadError> {
        let mut first_error: Option<DownloadError> = None;

        for source in &self.sources {
            match source.fetch(url).await {
                Ok(file) => {
                    log::info!("{} fetched {} via {}", url, file.file_name, source.name());
                    return Ok(file);
                }
                Err(e) => {
                    log::warn!("Source {} failed for {}: {}", source.name(), url, e);
                    let replace = match &first_error {
                        None => true,
                        Some(DownloadError::TooLarge { .. }) => false,
                        Some(_) => matches!(e, DownloadError::TooLarge { .. }),
                    };
                    if replace {
                        first_error = Some(e);
                    }
                }
            }
        }

        Err(first_error.unwrap_or_else(|| DownloadError::Unsupported(format!("no media source for {}", url))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::media::MediaKind;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        name: &'static str,
        outcome: fn() -> Result<MediaFile, DownloadError>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(name: &'static str, outcome: fn() -> Result<MediaFile, DownloadError>) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MediaSource for FakeSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self, _url: &str) -> Result<MediaFile, DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    fn ok_file() -> Result<MediaFile, DownloadError> {
        Ok(MediaFile {
            path: PathBuf::from("/tmp/x_tok.mp4"),
            file_name: "x_tok.mp4".into(),
            size_bytes: 10,
            title: "t".into(),
            uploader: None,
            description: None,
            token: "tok".into(),
            kind: MediaKind::Video,
        })
    }

    fn private_err() -> Result<MediaFile, DownloadError> {
        Err(DownloadError::YtDlp("ERROR: login required".into()))
    }

    fn http_err() -> Result<MediaFile, DownloadError> {
        Err(DownloadError::Http("502".into()))
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_success() {
        let first = FakeSource::new("first", ok_file);
        let second = FakeSource::new("second", ok_file);
        let chain = SourceChain::new().with(first.clone()).with(second.clone());

        assert!(chain.fetch("u").await.is_ok());
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_chain_falls_through_to_next_source() {
        let first = FakeSource::new("yt-dlp", private_err);
        let second = FakeSource::new("rapidapi", ok_file);
        let chain = SourceChain::new().with(first.clone()).with(second.clone());

        let file = chain.fetch("u").await.unwrap();
        assert_eq!(file.file_name, "x_tok.mp4");
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    fn too_large_err() -> Result<MediaFile, DownloadError> {
        Err(DownloadError::TooLarge {
            size_bytes: 40 * 1024 * 1024,
            limit_bytes: 25 * 1024 * 1024,
        })
    }

    fn extract_err() -> Result<MediaFile, DownloadError> {
        Err(DownloadError::YtDlp("ERROR: Unable to extract video url".into()))
    }

    #[tokio::test]
    async fn test_chain_prefers_too_large_from_later_source() {
        let chain = SourceChain::new()
            .with(FakeSource::new("yt-dlp", extract_err))
            .with(FakeSource::new("rapidapi", too_large_err));
        let result = chain.fetch("u").await;
        assert!(matches!(result, Err(DownloadError::TooLarge { .. })));

        let limit = 25 * 1024 * 1024;
        let plan = crate::discord::relay::plan_relay("u", "<@1>", &result, limit);
        assert!(matches!(plan, crate::discord::relay::RelayPlan::TooLarge { .. }), "{:?}", plan);
    }

    #[tokio::test]
    async fn test_chain_keeps_first_too_large() {
        let chain = SourceChain::new()
            .with(FakeSource::new("yt-dlp", too_large_err))
            .with(FakeSource::new("rapidapi", http_err));
        let err = chain.fetch("u").await.unwrap_err();
        assert!(matches!(err, DownloadError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_chain_reports_first_error() {
        let chain = SourceChain::new()
            .with(FakeSource::new("yt-dlp", private_err))
            .with(FakeSource::new("rapidapi", http_err));
        let err = chain.fetch("u").await.unwrap_err();
        assert!(matches!(err, DownloadError::YtDlp(_)));
        assert_eq!(chain.names(), vec!["yt-dlp", "rapidapi"]);
    }

    #[test]
    fn test_default_chain_without_rapidapi() {
        let service = Arc::new(InstagramService::default());
        let chain = default_chain(&service, PathBuf::from("/tmp"), 1024).unwrap();
        assert_eq!(chain.names(), vec!["yt-dlp"]);
    }

    #[tokio::test]
    async fn test_empty_chain_is_unsupported() {
        let chain = SourceChain::new();
        assert!(chain.is_empty());
        let err = chain.fetch("u").await.unwrap_err();
        assert!(matches!(err, DownloadError::Unsupported(_)));
    }
}

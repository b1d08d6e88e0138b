use async_trait::async_trait;

use crate::download::error::DownloadError;
use crate::download::media::MediaFile;
use crate::download::source::MediaSource;
use crate::download::ytdlp::YtDlpDownloader;

/// Media source powered by yt-dlp.
pub struct YtDlpSource {
    downloader: YtDlpDownloader,
}

impl YtDlpSource {
    pub fn new(downloader: YtDlpDownloader) -> Self {
        Self { downloader }
    }
}

impl Default for YtDlpSource {
    fn default() -> Self {
        Self::new(YtDlpDownloader::default())
    }
}

#[async_trait]
impl MediaSource for YtDlpSource {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(&self, url: &str) -> Result<MediaFile, DownloadError> {
        self.downloader.download(url).await
    }
}

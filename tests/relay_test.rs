//! Link relay pipeline with a fake media source and a recording channel.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use instarelay::core::error::AppError;
use instarelay::core::stats::BotStats;
use instarelay::discord::relay::{IncomingMessage, Relay, RelayChannel, RelayOutcome};
use instarelay::download::{DownloadError, MediaFile, MediaKind, MediaSource};

const URL: &str = "https://www.instagram.com/reel/ABC123";
const LIMIT: u64 = 1024;

/// Writes a file of `size` bytes into its directory on every fetch.
struct FileSource {
    dir: PathBuf,
    size: usize,
    fail_with: Option<fn() -> DownloadError>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
}

impl FileSource {
    fn new(dir: &TempDir, size: usize) -> Self {
        Self {
            dir: dir.path().to_path_buf(),
            size,
            fail_with: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl MediaSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self, _url: &str) -> Result<MediaFile, DownloadError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(make_err) = self.fail_with {
            return Err(make_err());
        }
        let token = instarelay::download::media::new_token();
        let file_name = format!("ABC123_{}.mp4", token);
        let path = self.dir.join(&file_name);
        std::fs::write(&path, vec![1u8; self.size])?;
        Ok(MediaFile {
            path,
            file_name,
            size_bytes: self.size as u64,
            title: "Clip".into(),
            uploader: None,
            description: None,
            token,
            kind: MediaKind::Video,
        })
    }
}

fn unavailable() -> DownloadError {
    DownloadError::YtDlp("ERROR: [Instagram] ABC123: This content isn't available".into())
}

#[derive(Default)]
struct RecordingChannel {
    events: Mutex<Vec<String>>,
    fail_status: bool,
    fail_upload: bool,
}

impl RecordingChannel {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayChannel for RecordingChannel {
    async fn start_typing(&self) {
        self.push("typing".into());
    }

    async fn post_status(&self, content: &str) -> Result<(), AppError> {
        if self.fail_status {
            return Err(AppError::Validation("missing permissions".into()));
        }
        self.push(format!("status: {}", content));
        Ok(())
    }

    async fn edit_status(&self, content: &str) -> Result<(), AppError> {
        self.push(format!("edit: {}", content));
        Ok(())
    }

    async fn upload(&self, file: &MediaFile) -> Result<(), AppError> {
        assert!(file.path.exists(), "file must still exist while uploading");
        if self.fail_upload {
            return Err(AppError::Validation("request entity too large".into()));
        }
        self.push(format!("upload: {}", file.kind.label()));
        Ok(())
    }

    async fn say(&self, content: &str) -> Result<(), AppError> {
        self.push(format!("say: {}", content));
        Ok(())
    }
}

fn relay_with(source: FileSource) -> (Relay, Arc<BotStats>) {
    let stats = Arc::new(BotStats::new());
    let relay = Relay::new(Arc::new(source), 42, LIMIT, stats.clone());
    (relay, stats)
}

fn dir_is_empty(dir: &TempDir) -> bool {
    std::fs::read_dir(dir.path()).unwrap().next().is_none()
}

#[tokio::test]
async fn test_successful_relay_uploads_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let (relay, stats) = relay_with(FileSource::new(&dir, 512));
    let channel = RecordingChannel::default();

    let outcome = relay.relay(URL, "<@7>", &channel).await;

    assert_eq!(outcome, RelayOutcome::Uploaded);
    let events = channel.events();
    assert_eq!(events.len(), 4, "{:?}", events);
    assert_eq!(events[0], "typing");
    assert_eq!(events[1], format!("status: 📥 Processing Instagram reel...\n{}", URL));
    assert!(events[2].starts_with("edit: **📥 Instagram Downloader**"));
    assert!(events[2].contains("Downloaded for <@7>"));
    assert_eq!(events[3], "upload: Video");
    assert_eq!(stats.links_relayed(), 1);
    assert_eq!(stats.downloads_failed(), 0);
    assert!(dir_is_empty(&dir));
}

#[tokio::test]
async fn test_download_failure_edits_status() {
    let dir = TempDir::new().unwrap();
    let mut source = FileSource::new(&dir, 512);
    source.fail_with = Some(unavailable as fn() -> DownloadError);
    let (relay, stats) = relay_with(source);
    let channel = RecordingChannel::default();

    let outcome = relay.relay(URL, "<@7>", &channel).await;

    assert_eq!(outcome, RelayOutcome::DownloadFailed);
    let events = channel.events();
    assert_eq!(events.len(), 3, "{:?}", events);
    assert!(events[2].starts_with("edit: ❌ Failed to download."));
    assert!(events[2].ends_with(URL));
    assert_eq!(stats.downloads_failed(), 1);
    assert_eq!(stats.links_relayed(), 0);
}

#[tokio::test]
async fn test_oversized_file_is_not_uploaded() {
    let dir = TempDir::new().unwrap();
    let (relay, stats) = relay_with(FileSource::new(&dir, 4096));
    let channel = RecordingChannel::default();

    let outcome = relay.relay(URL, "<@7>", &channel).await;

    assert_eq!(outcome, RelayOutcome::TooLarge);
    let events = channel.events();
    assert!(events.iter().all(|e| !e.starts_with("upload")), "{:?}", events);
    assert!(events[2].contains("File is too large for Discord"));
    assert_eq!(stats.downloads_failed(), 1);
    assert!(dir_is_empty(&dir));
}

#[tokio::test]
async fn test_upload_failure_is_reported_and_file_removed() {
    let dir = TempDir::new().unwrap();
    let (relay, stats) = relay_with(FileSource::new(&dir, 512));
    let channel = RecordingChannel {
        fail_upload: true,
        ..Default::default()
    };

    let outcome = relay.relay(URL, "<@7>", &channel).await;

    assert_eq!(outcome, RelayOutcome::UploadFailed);
    let last = channel.events().pop().unwrap();
    assert!(last.starts_with("say: ❌ Failed to send file. Error:"), "{}", last);
    assert_eq!(stats.downloads_failed(), 1);
    assert!(dir_is_empty(&dir));
}

#[tokio::test]
async fn test_status_falls_back_to_new_message() {
    let dir = TempDir::new().unwrap();
    let (relay, _) = relay_with(FileSource::new(&dir, 512));
    let channel = RecordingChannel {
        fail_status: true,
        ..Default::default()
    };

    relay.relay(URL, "<@7>", &channel).await;

    let events = channel.events();
    assert_eq!(events[0], "typing");
    assert!(events[1].starts_with("say: **📥 Instagram Downloader**"), "{:?}", events);
    assert!(events.iter().all(|e| !e.starts_with("edit")));
}

#[tokio::test]
async fn test_downloads_respect_concurrency_limit() {
    let dir = TempDir::new().unwrap();
    let mut source = FileSource::new(&dir, 16);
    source.delay = Duration::from_millis(50);
    let source = Arc::new(source);
    let relay = Arc::new(
        Relay::new(source.clone(), 42, LIMIT, Arc::new(BotStats::new())).with_concurrency(1),
    );

    let mut handles = Vec::new();
    for _ in 0..3 {
        let relay = relay.clone();
        handles.push(tokio::spawn(async move {
            let channel = RecordingChannel::default();
            relay.relay(URL, "<@7>", &channel).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), RelayOutcome::Uploaded);
    }
    assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_redelivered_message_is_skipped() {
    let dir = TempDir::new().unwrap();
    let (relay, _) = relay_with(FileSource::new(&dir, 16));
    let msg = IncomingMessage {
        id: 1001,
        channel_id: 42,
        author_is_bot: false,
        content: format!("check this {}", URL),
    };

    assert_eq!(relay.accept(&msg).as_deref(), Ok(URL));
    assert!(relay.accept(&msg).is_err());
}

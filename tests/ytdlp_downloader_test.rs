//! yt-dlp downloader against a fake yt-dlp shell script.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serial_test::serial;
use tempfile::TempDir;

use instarelay::download::cleanup::cleanup_media;
use instarelay::download::{DownloadError, MediaKind, MediaSource, SourceChain, YtDlpConfig, YtDlpDownloader, YtDlpSource};

/// Writes a fake yt-dlp. `on_primary` / `on_fallback` are shell snippets run for
/// the `best[ext=mp4]/best` and `best` format attempts; `$media` and `$info`
/// hold the resolved output paths.
fn fake_ytdlp(dir: &Path, on_primary: &str, on_fallback: &str) -> PathBuf {
    let calls = dir.join("calls.log");
    let script = format!(
        r#"#!/bin/sh
fmt=""
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -f) fmt="$2"; shift 2 ;;
    -o) out="$2"; shift 2 ;;
    --user-agent|--add-header) shift 2 ;;
    *) shift ;;
  esac
done
echo "$fmt" >> "{calls}"
media=$(echo "$out" | sed -e 's/%(id)s/ABC123/' -e 's/%(ext)s/mp4/')
info=$(echo "$out" | sed -e 's/%(id)s/ABC123/' -e 's/%(ext)s/info.json/')
if [ "$fmt" = "best" ]; then
  {on_fallback}
else
  {on_primary}
fi
"#,
        calls = calls.display(),
        on_primary = on_primary,
        on_fallback = on_fallback,
    );
    let path = dir.join("yt-dlp");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

const SUCCEED: &str = r#"printf 'videodata' > "$media"; printf '{"title":"Sunset","uploader":"natgeo","description":"golden hour"}' > "$info"; exit 0"#;
const SUCCEED_NO_INFO: &str = r#"printf 'videodata' > "$media"; exit 0"#;
const FAIL_TRANSIENT: &str = r#"printf 'x' > "$media.part"; echo "ERROR: [Instagram] ABC123: Unable to extract video url" >&2; exit 1"#;
const FAIL_PRIVATE: &str = r#"echo "ERROR: [Instagram] ABC123: Requested content is not available, rate-limit reached or login required" >&2; exit 1"#;

struct Setup {
    _bin_dir: TempDir,
    bin_dir_path: PathBuf,
    out: TempDir,
    downloader: YtDlpDownloader,
}

fn setup(on_primary: &str, on_fallback: &str) -> Setup {
    let bin_dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let bin = fake_ytdlp(bin_dir.path(), on_primary, on_fallback);
    let downloader = YtDlpDownloader::new(YtDlpConfig {
        bin: bin.to_string_lossy().into_owned(),
        output_dir: out.path().to_path_buf(),
        timeout: Duration::from_secs(10),
    });
    Setup {
        bin_dir_path: bin_dir.path().to_path_buf(),
        _bin_dir: bin_dir,
        out,
        downloader,
    }
}

fn calls(setup: &Setup) -> Vec<String> {
    std::fs::read_to_string(setup.bin_dir_path.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
#[serial]
async fn test_download_reads_info_json() {
    let setup = setup(SUCCEED, SUCCEED);
    let file = setup
        .downloader
        .download("https://www.instagram.com/reel/ABC123")
        .await
        .unwrap();

    assert!(file.path.exists());
    assert!(file.file_name.starts_with("ABC123_"));
    assert!(file.file_name.ends_with(".mp4"));
    assert_eq!(file.size_bytes, "videodata".len() as u64);
    assert_eq!(file.title, "Sunset");
    assert_eq!(file.uploader.as_deref(), Some("natgeo"));
    assert_eq!(file.description.as_deref(), Some("golden hour"));
    assert_eq!(file.kind, MediaKind::Video);
    assert_eq!(calls(&setup), vec!["best[ext=mp4]/best"]);

    cleanup_media(&file).await;
    assert!(files_in(setup.out.path()).is_empty());
}

#[tokio::test]
#[serial]
async fn test_title_defaults_without_info_json() {
    let setup = setup(SUCCEED_NO_INFO, SUCCEED_NO_INFO);
    let file = setup
        .downloader
        .download("https://www.instagram.com/p/ABC123")
        .await
        .unwrap();
    assert_eq!(file.title, "Instagram Media");
    assert_eq!(file.uploader, None);
}

#[tokio::test]
#[serial]
async fn test_transient_failure_falls_back_to_best() {
    let setup = setup(FAIL_TRANSIENT, SUCCEED);
    let file = setup
        .downloader
        .download("https://www.instagram.com/p/ABC123")
        .await
        .unwrap();

    assert_eq!(calls(&setup), vec!["best[ext=mp4]/best", "best"]);
    // The primary attempt's partial file is gone
    let names = files_in(setup.out.path());
    assert!(names.iter().all(|n| !n.ends_with(".part")), "{:?}", names);
    assert_eq!(file.title, "Sunset");
}

#[tokio::test]
#[serial]
async fn test_private_post_is_not_retried() {
    let setup = setup(FAIL_PRIVATE, SUCCEED);
    let err = setup
        .downloader
        .download("https://www.instagram.com/p/ABC123")
        .await
        .unwrap_err();

    match err {
        DownloadError::YtDlp(msg) => assert!(msg.contains("login required"), "{}", msg),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(calls(&setup), vec!["best[ext=mp4]/best"]);
    assert!(files_in(setup.out.path()).is_empty());
}

#[tokio::test]
#[serial]
async fn test_both_attempts_failing_leaves_nothing_behind() {
    let setup = setup(FAIL_TRANSIENT, FAIL_TRANSIENT);
    let err = setup
        .downloader
        .download("https://www.instagram.com/p/ABC123")
        .await
        .unwrap_err();
    assert!(matches!(err, DownloadError::YtDlp(_)));
    assert_eq!(calls(&setup).len(), 2);
    assert!(files_in(setup.out.path()).is_empty());
}

#[tokio::test]
#[serial]
async fn test_missing_binary_is_a_process_error() {
    let out = TempDir::new().unwrap();
    let downloader = YtDlpDownloader::new(YtDlpConfig {
        bin: "/nonexistent/yt-dlp".to_string(),
        output_dir: out.path().to_path_buf(),
        timeout: Duration::from_secs(5),
    });
    let err = downloader.download("https://www.instagram.com/p/ABC123").await.unwrap_err();
    assert!(matches!(err, DownloadError::Process(_)), "got {}", err);
    assert_eq!(downloader.check_version().await, None);
}

#[tokio::test]
#[serial]
async fn test_source_chain_uses_ytdlp() {
    let setup = setup(SUCCEED, SUCCEED);
    let chain = SourceChain::new().with(std::sync::Arc::new(YtDlpSource::new(setup.downloader.clone())));
    let file = chain.fetch("https://www.instagram.com/reel/ABC123").await.unwrap();
    assert_eq!(file.title, "Sunset");
    cleanup_media(&file).await;
    assert!(files_in(setup.out.path()).is_empty());
}

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::download::error::DownloadError;

#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Streams a remote media URL into `dir/file_name`.
///
/// The transfer is aborted and the partial file deleted once more than
/// `max_bytes` arrive (or the advertised length is already larger).
///
/// # Errors
///
/// - `DownloadError::Http` for network failures and non-2xx statuses
/// - `DownloadError::TooLarge` when the size limit is exceeded
/// - `DownloadError::Io` when the file cannot be written
///
/// # Example
///
/// ```no_run
/// use instarelay::download::fetch::fetch_to_file;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = reqwest::Client::new();
/// let dir = std::path::Path::new("/tmp/instagram-downloads");
/// let file = fetch_to_file(&client, "https://cdn.example/a.jpg", dir, "story_1.jpg", 25 * 1024 * 1024).await?;
/// println!("{} bytes", file.size_bytes);
/// # Ok(())
/// # }
/// ```
pub async fn fetch_to_file(
    client: &reqwest::Client,
    url: &str,
    dir: &Path,
    file_name: &str,
    max_bytes: u64,
) -> Result<FetchedFile, DownloadError> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(DownloadError::Http(format!("GET {} returned {}", url, status)));
    }

    if let Some(len) = resp.content_length() {
        if len > max_bytes {
            return Err(DownloadError::TooLarge {
                size_bytes: len,
                limit_bytes: max_bytes,
            });
        }
    }

    let path = dir.join(file_name);
    let mut file = tokio::fs::File::create(&path).await?;
    let mut written: u64 = 0;
    let mut stream = resp.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                drop(file);
                remove_partial(&path).await;
                return Err(e.into());
            }
        };
        written += chunk.len() as u64;
        if written > max_bytes {
            drop(file);
            remove_partial(&path).await;
            return Err(DownloadError::TooLarge {
                size_bytes: written,
                limit_bytes: max_bytes,
            });
        }
        if let Err(e) = file.write_all(&chunk).await {
            drop(file);
            remove_partial(&path).await;
            return Err(e.into());
        }
    }
    file.flush().await?;

    log::debug!("Fetched {} -> {} ({} bytes)", url, path.display(), written);
    Ok(FetchedFile {
        path,
        size_bytes: written,
    })
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        log::warn!("Failed to remove partial file {}: {}", path.display(), e);
    }
}

/// File extension for a media URL, ignoring the query string.
pub fn extension_from_url(url: &str, default: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .and_then(|last| last.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()))
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| default.to_string())
}

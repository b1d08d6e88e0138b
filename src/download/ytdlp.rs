//! yt-dlp backed Instagram downloader.
//!
//! Each download gets a unique token that is embedded in the output file name,
//! so concurrent downloads into the same directory never pick up each other's
//! files. The `.info.json` sidecar written by yt-dlp supplies the metadata.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;

use crate::core::config;
use crate::core::process::run_with_timeout;
use crate::download::cleanup::remove_token_files;
use crate::download::error::DownloadError;
use crate::download::media::{new_token, resolve_title, MediaFile, MediaKind};
use crate::download::ytdlp_errors::analyze_ytdlp_error;

#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    pub bin: String,
    pub output_dir: PathBuf,
    pub timeout: Duration,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            bin: config::YTDL_BIN.clone(),
            output_dir: PathBuf::from(&*config::DOWNLOAD_DIR),
            timeout: config::download::ytdlp_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct YtDlpDownloader {
    config: YtDlpConfig,
}

/// Returns the installed yt-dlp version, or `None` when the binary is missing.
pub async fn check_ytdlp() -> Option<String> {
    YtDlpDownloader::default().check_version().await
}

impl YtDlpDownloader {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    pub async fn check_version(&self) -> Option<String> {
        let mut cmd = Command::new(&self.config.bin);
        cmd.arg("--version");
        match run_with_timeout(&mut cmd, config::download::version_check_timeout()).await {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                log::info!("yt-dlp version: {}", version);
                Some(version)
            }
            Ok(output) => {
                log::warn!(
                    "yt-dlp --version exited with {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                None
            }
            Err(e) => {
                log::warn!("yt-dlp not available ({}): {}", self.config.bin, e);
                None
            }
        }
    }

    /// Downloads one Instagram link.
    ///
    /// Runs the primary attempt (mp4 preferred, info json, browser headers). If it
    /// fails and the failure is not permanent, a second attempt with `-f best` is
    /// made. Leftovers of a failed attempt are removed before returning.
    pub async fn download(&self, url: &str) -> Result<MediaFile, DownloadError> {
        let token = new_token();
        let template = self.output_template(&token);
        log::info!("Downloading {} with yt-dlp (token {})", url, token);

        let first = self.attempt(&primary_args(url, &template), &token).await;
        let err = match first {
            Ok(file) => return Ok(file),
            Err(e) => e,
        };

        if !should_fallback(&err) {
            log::warn!("yt-dlp failed for {} ({}), not retrying: {}", url, err.subcategory(), err);
            remove_token_files(&self.config.output_dir, &token).await;
            return Err(err);
        }

        log::warn!("yt-dlp primary attempt failed for {}: {}. Retrying with -f best", url, err);
        remove_token_files(&self.config.output_dir, &token).await;

        match self.attempt(&fallback_args(url, &template), &token).await {
            Ok(file) => Ok(file),
            Err(e) => {
                log::error!("yt-dlp fallback failed for {}: {}", url, e);
                remove_token_files(&self.config.output_dir, &token).await;
                Err(e)
            }
        }
    }

    fn output_template(&self, token: &str) -> String {
        self.config
            .output_dir
            .join(format!("%(id)s_{}.%(ext)s", token))
            .to_string_lossy()
            .into_owned()
    }

    async fn attempt(&self, args: &[String], token: &str) -> Result<MediaFile, DownloadError> {
        log::debug!("yt-dlp command: {} {}", self.config.bin, args.join(" "));

        let mut cmd = Command::new(&self.config.bin);
        cmd.args(args);
        let output = run_with_timeout(&mut cmd, self.config.timeout).await?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(DownloadError::YtDlp(stderr_summary(&stderr)));
        }
        if !stderr.trim().is_empty() {
            log::debug!("yt-dlp stderr: {}", stderr.trim());
        }

        self.collect(token).await
    }

    /// Locates the media file and sidecar produced for `token`.
    async fn collect(&self, token: &str) -> Result<MediaFile, DownloadError> {
        let dir = &self.config.output_dir;
        let mut media: Option<PathBuf> = None;
        let mut info: Option<PathBuf> = None;

        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.contains(token) {
                continue;
            }
            if name.ends_with(".info.json") {
                info = Some(entry.path());
            } else if !name.ends_with(".json") && !name.ends_with(".part") && !name.ends_with(".ytdl") {
                media = Some(entry.path());
            }
        }

        let path = media.ok_or_else(|| {
            DownloadError::FileNotFound(format!("yt-dlp finished but no file with token {} in {}", token, dir.display()))
        })?;
        let size_bytes = tokio::fs::metadata(&path).await?.len();
        let meta = match info {
            Some(p) => read_info_json(&p).await,
            None => Value::Null,
        };

        let uploader = non_empty_str(&meta, "uploader");
        let file = MediaFile {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size_bytes,
            title: resolve_title(non_empty_str(&meta, "title").as_deref(), uploader.as_deref()),
            uploader,
            description: non_empty_str(&meta, "description"),
            token: token.to_string(),
            kind: MediaKind::from_path(&path),
            path,
        };
        log::info!("Downloaded {} ({} bytes)", file.file_name, file.size_bytes);
        Ok(file)
    }
}

fn primary_args(url: &str, template: &str) -> Vec<String> {
    vec![
        "-f".into(),
        config::download::PRIMARY_FORMAT.into(),
        "--write-info-json".into(),
        "--no-warnings".into(),
        "--no-playlist".into(),
        "--geo-bypass".into(),
        "--user-agent".into(),
        config::download::USER_AGENT.into(),
        "--add-header".into(),
        "Accept-Language: en-US,en;q=0.9".into(),
        "-o".into(),
        template.into(),
        url.into(),
    ]
}

fn fallback_args(url: &str, template: &str) -> Vec<String> {
    vec![
        "-f".into(),
        config::download::FALLBACK_FORMAT.into(),
        "--write-info-json".into(),
        "--no-playlist".into(),
        "-o".into(),
        template.into(),
        url.into(),
    ]
}

/// Timeouts and a missing binary will not be fixed by a second format choice.
fn should_fallback(err: &DownloadError) -> bool {
    match err {
        DownloadError::YtDlp(stderr) => !analyze_ytdlp_error(stderr).is_permanent(),
        DownloadError::FileNotFound(_) => true,
        _ => false,
    }
}

/// The last `ERROR:` line, else the last non-empty line.
fn stderr_summary(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
        .unwrap_or_else(|| "yt-dlp exited with an error".to_string())
}

async fn read_info_json(path: &Path) -> Value {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
            log::warn!("Unreadable info json {}: {}", path.display(), e);
            Value::Null
        }),
        Err(e) => {
            log::warn!("Failed to read info json {}: {}", path.display(), e);
            Value::Null
        }
    }
}

fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_args_shape() {
        let args = primary_args("https://instagram.com/p/ABC", "/tmp/x/%(id)s_tok.%(ext)s");
        assert_eq!(&args[0..2], &["-f".to_string(), "best[ext=mp4]/best".to_string()]);
        assert!(args.contains(&"--write-info-json".to_string()));
        assert!(args.contains(&"--geo-bypass".to_string()));
        assert!(args.contains(&"Accept-Language: en-US,en;q=0.9".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://instagram.com/p/ABC"));
    }

    #[test]
    fn test_fallback_args_use_best() {
        let args = fallback_args("https://instagram.com/p/ABC", "/tmp/t");
        assert_eq!(&args[0..2], &["-f".to_string(), "best".to_string()]);
        assert!(!args.contains(&"--geo-bypass".to_string()));
    }

    #[test]
    fn test_should_fallback() {
        assert!(should_fallback(&DownloadError::YtDlp("ERROR: Read timed out".into())));
        assert!(should_fallback(&DownloadError::FileNotFound("none".into())));
        assert!(!should_fallback(&DownloadError::YtDlp("ERROR: HTTP Error 404: Not Found".into())));
        assert!(!should_fallback(&DownloadError::YtDlp(
            "ERROR: login required, use --cookies".into()
        )));
        assert!(!should_fallback(&DownloadError::Timeout("180s".into())));
        assert!(!should_fallback(&DownloadError::Process("not found".into())));
    }

    #[test]
    fn test_stderr_summary() {
        let stderr = "[instagram] Extracting URL\nWARNING: something\nERROR: [Instagram] x: Not Found\n";
        assert_eq!(stderr_summary(stderr), "ERROR: [Instagram] x: Not Found");
        assert_eq!(stderr_summary("only a line\n"), "only a line");
        assert_eq!(stderr_summary(""), "yt-dlp exited with an error");
    }

    #[test]
    fn test_non_empty_str() {
        let v = serde_json::json!({"title": "", "uploader": "natgeo"});
        assert_eq!(non_empty_str(&v, "title"), None);
        assert_eq!(non_empty_str(&v, "uploader").as_deref(), Some("natgeo"));
        assert_eq!(non_empty_str(&Value::Null, "title"), None);
    }
}

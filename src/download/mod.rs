//! Media download: yt-dlp, direct fetches, and temp file housekeeping

pub mod cleanup;
pub mod error;
pub mod fetch;
pub mod media;
pub mod source;
pub mod ytdlp;
pub mod ytdlp_errors;

// Re-exports for convenience
pub use error::DownloadError;
pub use media::{MediaFile, MediaKind};
pub use source::{MediaSource, RapidApiSource, SourceChain, YtDlpSource};
pub use ytdlp::{check_ytdlp, YtDlpConfig, YtDlpDownloader};

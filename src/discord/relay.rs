//! Link relay: download Instagram links posted in the relay channel and
//! re-upload the media.
//!
//! The Discord side is behind [`RelayChannel`] so the pipeline can run against
//! a fake channel in tests. [`plan_relay`] is the pure decision step between the
//! download outcome and what gets posted.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::core::config;
use crate::core::dedup::ProcessedMessages;
use crate::core::error::AppError;
use crate::core::stats::BotStats;
use crate::discord::render;
use crate::download::cleanup::cleanup_media;
use crate::download::error::DownloadError;
use crate::download::media::MediaFile;
use crate::download::source::MediaSource;
use crate::download::ytdlp_errors::analyze_ytdlp_error;
use crate::instagram::url::extract_instagram_url;

/// The parts of a Discord message the relay looks at.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: u64,
    pub channel_id: u64,
    pub author_is_bot: bool,
    pub content: String,
}

/// Why a message was not relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    FromBot,
    OtherChannel,
    Duplicate,
    NoLink,
}

/// Where relay output goes. Implemented over serenity in `handler`.
#[async_trait]
pub trait RelayChannel: Send + Sync {
    async fn start_typing(&self);

    /// Replies to the triggering message with the status line.
    async fn post_status(&self, content: &str) -> Result<(), AppError>;

    /// Replaces the status line posted by `post_status`.
    async fn edit_status(&self, content: &str) -> Result<(), AppError>;

    async fn upload(&self, file: &MediaFile) -> Result<(), AppError>;

    /// Sends a standalone message to the channel.
    async fn say(&self, content: &str) -> Result<(), AppError>;
}

/// What to do with a finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayPlan {
    Failed { status: String },
    TooLarge { status: String },
    Upload { status: String },
}

/// How a relay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Uploaded,
    DownloadFailed,
    TooLarge,
    UploadFailed,
}

pub fn plan_relay(
    url: &str,
    requester: &str,
    outcome: &Result<MediaFile, DownloadError>,
    limit_bytes: u64,
) -> RelayPlan {
    match outcome {
        Err(DownloadError::TooLarge {
            size_bytes,
            limit_bytes: reported,
        }) => RelayPlan::TooLarge {
            status: render::relay_too_large(url, *size_bytes, *reported),
        },
        Err(e) => RelayPlan::Failed {
            status: render::relay_failed(url, analyze_ytdlp_error(e.message()).user_message()),
        },
        Ok(file) if file.size_bytes > limit_bytes => RelayPlan::TooLarge {
            status: render::relay_too_large(url, file.size_bytes, limit_bytes),
        },
        Ok(file) => RelayPlan::Upload {
            status: render::relay_success(requester, file.kind, file.size_bytes, url),
        },
    }
}

pub struct Relay {
    source: Arc<dyn MediaSource>,
    permits: Semaphore,
    processed: ProcessedMessages,
    channel_id: u64,
    max_bytes: u64,
    stats: Arc<BotStats>,
}

impl Relay {
    pub fn new(source: Arc<dyn MediaSource>, channel_id: u64, max_bytes: u64, stats: Arc<BotStats>) -> Self {
        Self {
            source,
            permits: Semaphore::new(config::download::MAX_CONCURRENT_DOWNLOADS),
            processed: ProcessedMessages::default(),
            channel_id,
            max_bytes,
            stats,
        }
    }

    pub fn with_concurrency(mut self, permits: usize) -> Self {
        self.permits = Semaphore::new(permits.max(1));
        self
    }

    pub fn channel_id(&self) -> u64 {
        self.channel_id
    }

    /// Decides whether a message should be relayed and returns its link.
    ///
    /// Checks run in order: bot author, channel, already processed, link present.
    /// The message ID is recorded as soon as it passes the channel check.
    pub fn accept(&self, msg: &IncomingMessage) -> Result<String, Skip> {
        if msg.author_is_bot {
            return Err(Skip::FromBot);
        }
        if msg.channel_id != self.channel_id {
            return Err(Skip::OtherChannel);
        }
        if !self.processed.check_and_insert(msg.id) {
            return Err(Skip::Duplicate);
        }
        extract_instagram_url(&msg.content).ok_or(Skip::NoLink)
    }

    /// Downloads `url` and posts the result through `channel`.
    ///
    /// The downloaded file is removed before this returns, whatever the outcome.
    pub async fn relay(&self, url: &str, requester: &str, channel: &dyn RelayChannel) -> RelayOutcome {
        channel.start_typing().await;
        let status_posted = match channel.post_status(&render::relay_processing(url)).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to post status for {}: {}", url, e);
                false
            }
        };

        let outcome = match self.permits.acquire().await {
            Ok(_permit) => self.source.fetch(url).await,
            Err(_) => Err(DownloadError::Other("download queue closed".to_string())),
        };

        if let Err(e) = &outcome {
            log::error!("Download failed for {} [{}]: {}", url, e.subcategory(), e);
        }

        let plan = plan_relay(url, requester, &outcome, self.max_bytes);
        let result = match &plan {
            RelayPlan::Failed { status } => {
                update_status(channel, status_posted, status).await;
                self.stats.record_failure();
                RelayOutcome::DownloadFailed
            }
            RelayPlan::TooLarge { status } => {
                log::warn!("{} is over the upload limit", url);
                update_status(channel, status_posted, status).await;
                self.stats.record_failure();
                RelayOutcome::TooLarge
            }
            RelayPlan::Upload { status } => {
                update_status(channel, status_posted, status).await;
                match &outcome {
                    Ok(file) => self.upload(url, file, channel).await,
                    Err(_) => RelayOutcome::DownloadFailed,
                }
            }
        };

        if let Ok(file) = &outcome {
            cleanup_media(file).await;
        }
        result
    }

    async fn upload(&self, url: &str, file: &MediaFile, channel: &dyn RelayChannel) -> RelayOutcome {
        match channel.upload(file).await {
            Ok(()) => {
                log::info!("Relayed {} ({} bytes) from {}", file.file_name, file.size_bytes, url);
                self.stats.record_relay();
                RelayOutcome::Uploaded
            }
            Err(e) => {
                log::error!("Upload of {} failed: {}", file.file_name, e);
                if let Err(e) = channel.say(&render::relay_upload_failed(&e.to_string())).await {
                    log::warn!("Failed to report upload error: {}", e);
                }
                self.stats.record_failure();
                RelayOutcome::UploadFailed
            }
        }
    }
}

/// Edits the status line, or sends a new message when none was posted.
async fn update_status(channel: &dyn RelayChannel, status_posted: bool, content: &str) {
    let result = if status_posted {
        channel.edit_status(content).await
    } else {
        channel.say(content).await
    };
    if let Err(e) = result {
        log::warn!("Failed to update relay status: {}", e);
    }
}

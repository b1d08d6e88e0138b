//! serenity event handler: routes messages to text commands or the link relay.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serenity::all::{
    ActivityData, ChannelId, Context, CreateAttachment, CreateMessage, EditMessage, EventHandler, Mentionable,
    Message, Ready,
};
use tokio::sync::Mutex;

use crate::core::config;
use crate::core::error::AppError;
use crate::core::stats::BotStats;
use crate::core::utils::escape_filename;
use crate::discord::commands::{acknowledgement, execute, parse_command, Command, CommandEnv, Reply};
use crate::discord::relay::{IncomingMessage, Relay, RelayChannel, Skip};
use crate::discord::render;
use crate::download::fetch::fetch_to_file;
use crate::download::media::{new_token, MediaFile};
use crate::download::ytdlp::check_ytdlp;
use crate::scraper::service::InstagramService;

pub struct Handler {
    relay: Arc<Relay>,
    service: Arc<InstagramService>,
    stats: Arc<BotStats>,
    http: reqwest::Client,
    download_dir: PathBuf,
    max_bytes: u64,
    prefix: String,
    bot_name: OnceCell<String>,
}

impl Handler {
    pub fn new(
        relay: Arc<Relay>,
        service: Arc<InstagramService>,
        stats: Arc<BotStats>,
        download_dir: PathBuf,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(config::download::USER_AGENT)
            .timeout(config::network::media_timeout())
            .connect_timeout(config::network::connect_timeout())
            .build()?;
        Ok(Self {
            relay,
            service,
            stats,
            http,
            download_dir,
            max_bytes: *config::limits::MAX_UPLOAD_BYTES,
            prefix: config::COMMAND_PREFIX.clone(),
            bot_name: OnceCell::new(),
        })
    }

    fn bot_name(&self) -> &str {
        self.bot_name.get().map(String::as_str).unwrap_or("instarelay")
    }

    async fn run_command(&self, ctx: &Context, msg: &Message, command: Command) {
        let mut status = match acknowledgement(&command) {
            Some(text) => match msg.reply_ping(ctx, text).await {
                Ok(sent) => Some(sent),
                Err(e) => {
                    log::warn!("Failed to acknowledge {}: {}", command.name(), e);
                    None
                }
            },
            None => None,
        };

        let env = CommandEnv {
            service: &self.service,
            stats: &self.stats,
            bot_name: self.bot_name(),
            prefix: &self.prefix,
        };

        for reply in execute(&command, &env).await {
            let result = match reply {
                // The first text reply replaces the acknowledgement.
                Reply::Text(text) => match status.take() {
                    Some(mut ack) => ack
                        .edit(ctx, EditMessage::new().content(text))
                        .await
                        .map_err(AppError::from),
                    None => msg.channel_id.say(&ctx.http, text).await.map(|_| ()).map_err(AppError::from),
                },
                Reply::Media { url, file_name } => {
                    let sent = self.send_media(ctx, msg.channel_id, &url, &file_name).await;
                    if let Err(e) = &sent {
                        log::error!("Failed to attach {} ({}): {}", file_name, url, e);
                        if let Err(e) = msg.channel_id.say(&ctx.http, render::media_send_failed()).await {
                            log::warn!("Failed to send media failure notice: {}", e);
                        }
                    }
                    Ok(())
                }
            };
            if let Err(e) = result {
                log::error!("Command {} failed to reply [{}]: {}", command.name(), e.category(), e);
            }
        }
    }

    /// Streams `url` to a temp file, attaches it as `file_name`, then removes the temp file.
    async fn send_media(&self, ctx: &Context, channel: ChannelId, url: &str, file_name: &str) -> Result<(), AppError> {
        let local_name = format!("{}_{}", new_token(), escape_filename(file_name));
        let fetched = fetch_to_file(&self.http, url, &self.download_dir, &local_name, self.max_bytes).await?;

        let sent = async {
            let data = tokio::fs::read(&fetched.path).await?;
            let attachment = CreateAttachment::bytes(data, file_name.to_string());
            channel
                .send_message(&ctx.http, CreateMessage::new().add_file(attachment))
                .await?;
            Ok::<(), AppError>(())
        }
        .await;

        if let Err(e) = tokio::fs::remove_file(&fetched.path).await {
            log::warn!("Failed to remove {}: {}", fetched.path.display(), e);
        }
        sent
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        log::info!("✅ Logged in as {}", ready.user.name);
        let _ = self.bot_name.set(ready.user.name.clone());
        self.stats.set_guilds(ready.guilds.len());
        log::info!("Connected to {} guild(s)", ready.guilds.len());

        ctx.set_activity(Some(ActivityData::watching("Instagram Links")));

        match check_ytdlp().await {
            Some(version) => log::info!("yt-dlp version: {}", version),
            None => log::error!("yt-dlp is not available - link relay downloads will fail"),
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        match parse_command(&self.prefix, &msg.content) {
            Some(Ok(command)) => {
                log::info!("{} used {}{}", msg.author.name, self.prefix, command.name());
                self.run_command(&ctx, &msg, command).await;
                return;
            }
            Some(Err(e)) => {
                if let Err(e) = msg.reply_ping(&ctx, e.to_string()).await {
                    log::warn!("Failed to send usage hint: {}", e);
                }
                return;
            }
            None => {}
        }

        let incoming = IncomingMessage {
            id: msg.id.get(),
            channel_id: msg.channel_id.get(),
            author_is_bot: msg.author.bot,
            content: msg.content.clone(),
        };
        let url = match self.relay.accept(&incoming) {
            Ok(url) => url,
            Err(Skip::Duplicate) => {
                log::debug!("Message {} already processed", incoming.id);
                return;
            }
            Err(_) => return,
        };

        log::info!("Instagram link from {}: {}", msg.author.name, url);
        let requester = msg.author.mention().to_string();
        let channel = DiscordRelayChannel::new(&ctx, &msg);
        let outcome = self.relay.relay(&url, &requester, &channel).await;
        log::info!("Relay of {} finished: {:?}", url, outcome);
    }
}

/// Relay output over a serenity context, replying to the triggering message.
pub struct DiscordRelayChannel<'a> {
    ctx: &'a Context,
    source: &'a Message,
    status: Mutex<Option<Message>>,
}

impl<'a> DiscordRelayChannel<'a> {
    pub fn new(ctx: &'a Context, source: &'a Message) -> Self {
        Self {
            ctx,
            source,
            status: Mutex::new(None),
        }
    }
}

#[async_trait]
impl RelayChannel for DiscordRelayChannel<'_> {
    async fn start_typing(&self) {
        if let Err(e) = self.source.channel_id.broadcast_typing(&self.ctx.http).await {
            log::debug!("Typing indicator failed: {}", e);
        }
    }

    async fn post_status(&self, content: &str) -> Result<(), AppError> {
        let sent = self.source.reply_ping(self.ctx, content).await?;
        *self.status.lock().await = Some(sent);
        Ok(())
    }

    async fn edit_status(&self, content: &str) -> Result<(), AppError> {
        let mut status = self.status.lock().await;
        match status.as_mut() {
            Some(message) => {
                message.edit(self.ctx, EditMessage::new().content(content)).await?;
                Ok(())
            }
            None => Err(AppError::Validation("no status message to edit".to_string())),
        }
    }

    async fn upload(&self, file: &MediaFile) -> Result<(), AppError> {
        let attachment = CreateAttachment::path(&file.path).await?;
        self.source
            .channel_id
            .send_message(&self.ctx.http, CreateMessage::new().add_file(attachment))
            .await?;
        Ok(())
    }

    async fn say(&self, content: &str) -> Result<(), AppError> {
        self.source.channel_id.say(&self.ctx.http, content).await?;
        Ok(())
    }
}

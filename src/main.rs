use anyhow::Result;
use dotenvy::dotenv;
use serenity::all::{Client, GatewayIntents};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;

use instarelay::cli::{Cli, Commands};
use instarelay::core::stats::BotStats;
use instarelay::core::{config, init_logger, log_startup_configuration};
use instarelay::discord::{Handler, Relay};
use instarelay::download::cleanup::{cleanup_all, ensure_dir};
use instarelay::download::source::default_chain;
use instarelay::download::{check_ytdlp, MediaSource};
use instarelay::instagram::url::{extract_instagram_url, InstagramLink};
use instarelay::scraper::InstagramService;

/// Main entry point for the Discord bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, configuration, Discord client).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics from handler tasks instead of losing them on stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // .env must be loaded before the first config static is read
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH, &config::LOG_LEVEL)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::CheckYtdlp) => run_check_ytdlp().await,
        Some(Commands::Download { url, output }) => run_cli_download(url, output).await,
        Some(Commands::Profile { username }) => {
            let service = lookup_service()?;
            print_json(&service.profile(username.trim_start_matches('@')).await)
        }
        Some(Commands::Stories { username }) => {
            let service = lookup_service()?;
            print_json(&service.stories(username.trim_start_matches('@')).await)
        }
        Some(Commands::Reel { url }) => {
            let service = lookup_service()?;
            print_json(&service.reel(&url).await)
        }
        Some(Commands::Post { url }) => {
            let service = lookup_service()?;
            print_json(&service.post(&url).await)
        }
    }
}

async fn run_bot() -> Result<()> {
    config::validate_for_bot()?;
    log_startup_configuration();

    let download_dir = PathBuf::from(&*config::DOWNLOAD_DIR);
    ensure_dir(&download_dir)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", download_dir.display(), e))?;

    match check_ytdlp().await {
        Some(version) => log::info!("yt-dlp {} found", version),
        None => log::warn!("yt-dlp not found at {} - link relay will fail", config::YTDL_BIN.as_str()),
    }

    let max_bytes = *config::limits::MAX_UPLOAD_BYTES;
    let service = Arc::new(InstagramService::from_env());
    let chain = default_chain(&service, download_dir.clone(), max_bytes)?;
    log::info!("Media sources: {}", chain.names().join(" -> "));

    let channel_id = config::DISCORD_CHANNEL_ID.ok_or_else(|| anyhow::anyhow!("DISCORD_CHANNEL_ID is not set"))?;
    let stats = Arc::new(BotStats::new());
    let relay = Arc::new(Relay::new(Arc::new(chain), channel_id, max_bytes, stats.clone()));
    let handler = Handler::new(relay, service, stats, download_dir.clone())?;

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
    let mut client = Client::builder(config::DISCORD_BOT_TOKEN.as_str(), intents)
        .event_handler(handler)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Discord client: {}", e))?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        log::info!("Shutting down gracefully...");
        match cleanup_all(&download_dir).await {
            Ok(removed) => log::info!("Removed {} leftover file(s) from {}", removed, download_dir.display()),
            Err(e) => log::warn!("Failed to clean {}: {}", download_dir.display(), e),
        }
        shard_manager.shutdown_all().await;
    });

    log::info!("🚀 Connecting to Discord...");
    client.start().await?;
    log::info!("Discord client stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut term = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                log::warn!("Cannot listen for SIGTERM: {}", e);
                let _ = signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
    }
}

async fn run_check_ytdlp() -> Result<()> {
    match check_ytdlp().await {
        Some(version) => {
            println!("✅ yt-dlp {} ({})", version, config::YTDL_BIN.as_str());
            Ok(())
        }
        None => Err(anyhow::anyhow!(
            "yt-dlp not found or not runnable: {}",
            config::YTDL_BIN.as_str()
        )),
    }
}

/// Downloads one link with the same source chain the relay uses and keeps the file.
async fn run_cli_download(url: String, output: Option<String>) -> Result<()> {
    let url = extract_instagram_url(&url).ok_or_else(|| anyhow::anyhow!("Not an Instagram link: {}", url))?;
    let output_dir = PathBuf::from(output.unwrap_or_else(|| ".".to_string()));
    ensure_dir(&output_dir).await?;

    match InstagramLink::parse(&url) {
        Some(link) => println!(
            "📥 Downloading {} {}",
            link.kind_label(),
            link.shortcode().unwrap_or(url.as_str())
        ),
        None => println!("📥 Downloading {}", url),
    }
    let service = Arc::new(InstagramService::from_env());
    // No upload here, so no upload limit either
    let chain = default_chain(&service, output_dir.clone(), u64::MAX)?;

    let file = chain.fetch(&url).await?;
    println!("✅ {} ({:.2} MB)", file.path.display(), file.size_bytes as f64 / 1024.0 / 1024.0);
    println!("   Title: {}", file.title);
    if let Some(uploader) = &file.uploader {
        println!("   Uploader: {}", uploader);
    }
    remove_info_json(&output_dir, &file.token).await;
    Ok(())
}

/// Drops the `.info.json` written next to the media, keeping the media itself.
async fn remove_info_json(dir: &Path, token: &str) {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.contains(token) && name.ends_with(".info.json") {
            if let Err(e) = tokio::fs::remove_file(entry.path()).await {
                log::warn!("Failed to remove {}: {}", entry.path().display(), e);
            }
        }
    }
}

fn lookup_service() -> Result<InstagramService> {
    let service = InstagramService::from_env();
    if !service.is_configured() {
        return Err(anyhow::anyhow!("APIFY_TOKEN is not set"));
    }
    Ok(service)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup diagnostics for the configured backends

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Maps a textual level (`LOG_LEVEL`) to a filter. Unknown values fall back to Info.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
/// * `level` - Level name as accepted by [`parse_level`]
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str, level: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;
    let filter = parse_level(level);

    // serenity and the HTTP stack are chatty at info
    let config = ConfigBuilder::new()
        .add_filter_ignore_str("serenity")
        .add_filter_ignore_str("tungstenite")
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("rustls")
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(filter, config.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(filter, config, log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs which backends are configured at application startup
///
/// Validates and logs:
/// - yt-dlp binary and download directory
/// - Apify token presence (profile/stories/reel/post commands)
/// - RapidAPI key presence (fallback media source)
/// - Relay channel
pub fn log_startup_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("⚙️  Configuration Check");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    log::info!("YTDL_BIN: {}", config::YTDL_BIN.as_str());
    log::info!("DOWNLOAD_DIR: {}", config::DOWNLOAD_DIR.as_str());
    log::info!(
        "Upload limit: {:.0} MB",
        *config::limits::MAX_UPLOAD_BYTES as f64 / 1024.0 / 1024.0
    );

    match *config::DISCORD_CHANNEL_ID {
        Some(id) => log::info!("✅ DISCORD_CHANNEL_ID: {}", id),
        None => log::error!("❌ DISCORD_CHANNEL_ID: not set or invalid - link relay is disabled"),
    }

    if config::APIFY_TOKEN.is_some() {
        log::info!("✅ APIFY_TOKEN: set ({}, {}, {}, {})", "profile", "stories", "reel", "post");
    } else {
        log::warn!("⚠️  APIFY_TOKEN: not set - lookup commands will report an unconfigured backend");
    }

    if config::RAPIDAPI_KEY.is_some() {
        log::info!("✅ RAPIDAPI_KEY: set (fallback source after yt-dlp)");
    } else {
        log::info!("RAPIDAPI_KEY: not set (yt-dlp is the only media source)");
    }

    log::info!("Command prefix: {}", config::COMMAND_PREFIX.as_str());
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

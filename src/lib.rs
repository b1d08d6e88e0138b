//! instarelay - Discord bot that relays Instagram media into a channel
//!
//! Links posted in the relay channel are downloaded with yt-dlp (RapidAPI as a
//! fallback) and re-uploaded. Text commands look up profiles, stories, reels
//! and posts through Apify actors.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, retry, and shared state
//! - `instagram`: link parsing and the DTOs handed to rendering
//! - `scraper`: Apify and RapidAPI clients plus response reshaping
//! - `download`: yt-dlp, direct media fetches, and temp file cleanup
//! - `discord`: serenity handler, text commands, and the link relay

pub mod cli;
pub mod core;
pub mod discord;
pub mod download;
pub mod instagram;
pub mod scraper;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use discord::{Handler, Relay};
pub use download::{MediaSource, SourceChain};
pub use scraper::InstagramService;

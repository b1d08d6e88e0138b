//! Prefix text commands: parsing and execution.
//!
//! Execution produces a list of [`Reply`] values; the handler delivers them in
//! order, downloading `Reply::Media` URLs as attachments.

use thiserror::Error;

use crate::core::config::limits;
use crate::core::stats::BotStats;
use crate::core::utils::escape_filename;
use crate::discord::render;
use crate::instagram::url::{extract_instagram_url, extract_profile_username, is_valid_username};
use crate::scraper::service::InstagramService;

/// Number of commands shown by `help` and `stats`.
pub const COMMAND_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Profile { username: String },
    Stories { username: String },
    Reel { url: String },
    Post { url: String },
    Stats,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Profile { .. } => "profile",
            Command::Stories { .. } => "stories",
            Command::Reel { .. } => "reel",
            Command::Post { .. } => "post",
            Command::Stats => "stats",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Usage: `{usage}`")]
    MissingArgument { usage: String },

    #[error("`{0}` is not a valid Instagram username")]
    InvalidUsername(String),

    #[error("`{0}` is not an Instagram link")]
    InvalidUrl(String),
}

/// Parses `content` as a prefix command.
///
/// Returns `None` when the message is not a known command, so ordinary chat
/// (and other bots' commands) pass through untouched.
///
/// # Example
///
/// ```
/// use instarelay::discord::commands::{parse_command, Command};
///
/// let cmd = parse_command("!", "!profile @natgeo").unwrap().unwrap();
/// assert_eq!(cmd, Command::Profile { username: "natgeo".to_string() });
/// assert!(parse_command("!", "hello there").is_none());
/// ```
pub fn parse_command(prefix: &str, content: &str) -> Option<Result<Command, CommandError>> {
    let rest = content.trim().strip_prefix(prefix)?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?.to_lowercase();
    let arg = parts.next();

    let parsed = match name.as_str() {
        "help" => Ok(Command::Help),
        "stats" => Ok(Command::Stats),
        "profile" => username_arg(prefix, "profile", arg).map(|username| Command::Profile { username }),
        "stories" => username_arg(prefix, "stories", arg).map(|username| Command::Stories { username }),
        "reel" => url_arg(prefix, "reel", arg).map(|url| Command::Reel { url }),
        "post" => url_arg(prefix, "post", arg).map(|url| Command::Post { url }),
        _ => return None,
    };
    Some(parsed)
}

pub fn usage(prefix: &str, command: &str) -> String {
    match command {
        "profile" | "stories" => format!("{}{} <username>", prefix, command),
        "reel" | "post" => format!("{}{} <url>", prefix, command),
        other => format!("{}{}", prefix, other),
    }
}

/// Accepts `name`, `@name`, or a profile URL.
fn username_arg(prefix: &str, command: &str, arg: Option<&str>) -> Result<String, CommandError> {
    let raw = arg.ok_or_else(|| CommandError::MissingArgument {
        usage: usage(prefix, command),
    })?;

    if raw.starts_with("http") {
        return extract_profile_username(raw).ok_or_else(|| CommandError::InvalidUsername(raw.to_string()));
    }

    let username = raw.trim_start_matches('@');
    if is_valid_username(username) {
        Ok(username.to_string())
    } else {
        Err(CommandError::InvalidUsername(raw.to_string()))
    }
}

fn url_arg(prefix: &str, command: &str, arg: Option<&str>) -> Result<String, CommandError> {
    let raw = arg.ok_or_else(|| CommandError::MissingArgument {
        usage: usage(prefix, command),
    })?;
    extract_instagram_url(raw).ok_or_else(|| CommandError::InvalidUrl(raw.to_string()))
}

/// One outgoing message produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// Remote media to download and attach under `file_name`
    Media { url: String, file_name: String },
}

/// What command execution needs from the running bot.
pub struct CommandEnv<'a> {
    pub service: &'a InstagramService,
    pub stats: &'a BotStats,
    pub bot_name: &'a str,
    pub prefix: &'a str,
}

/// Status line shown while a slow lookup runs.
pub fn acknowledgement(command: &Command) -> Option<String> {
    match command {
        Command::Profile { username } => Some(render::fetching_profile(username)),
        Command::Stories { username } => Some(render::fetching_stories(username)),
        Command::Reel { .. } => Some(render::fetching_reel()),
        Command::Post { .. } => Some(render::fetching_post()),
        Command::Help | Command::Stats => None,
    }
}

pub async fn execute(command: &Command, env: &CommandEnv<'_>) -> Vec<Reply> {
    env.stats.record_command();
    log::info!("Executing command: {}", command.name());

    let needs_scraper = !matches!(command, Command::Help | Command::Stats);
    if needs_scraper && !env.service.is_configured() {
        return vec![Reply::Text(render::not_configured())];
    }

    match command {
        Command::Help => vec![Reply::Text(render::help(env.prefix))],
        Command::Stats => vec![Reply::Text(render::stats(env.bot_name, env.stats, COMMAND_COUNT))],
        Command::Profile { username } => {
            let profile = env.service.profile(username).await;
            vec![Reply::Text(render::profile(&profile))]
        }
        Command::Stories { username } => {
            let stories = env.service.stories(username).await;
            stories_replies(username, &stories)
        }
        Command::Reel { url } => match env.service.reel(url).await {
            None => vec![Reply::Text(render::reel_not_found())],
            Some(reel) => {
                let mut replies = vec![Reply::Text(render::reel(&reel))];
                if let Some(video) = &reel.video_url {
                    replies.push(Reply::Media {
                        url: video.clone(),
                        file_name: attachment_name("reel", reel.short_code.as_deref(), "mp4"),
                    });
                }
                replies
            }
        },
        Command::Post { url } => match env.service.post(url).await {
            None => vec![Reply::Text(render::post_not_found())],
            Some(post) => {
                let mut replies = vec![Reply::Text(render::post(&post))];
                replies.extend(post_media(&post));
                replies
            }
        },
    }
}

/// `<prefix>_<id>.<ext>` with the scraper-supplied id made safe for a file name.
fn attachment_name(prefix: &str, id: Option<&str>, ext: &str) -> String {
    escape_filename(&format!("{}_{}.{}", prefix, id.unwrap_or("video"), ext))
}

fn stories_replies(username: &str, stories: &[crate::instagram::models::Story]) -> Vec<Reply> {
    if stories.is_empty() {
        return vec![Reply::Text(render::no_stories(username))];
    }

    let mut replies = vec![Reply::Text(render::stories_summary(username, stories.len()))];
    for (i, story) in stories.iter().take(limits::MAX_STORIES).enumerate() {
        replies.push(Reply::Text(render::story(i + 1, story)));
        if story.is_video() {
            if let Some(url) = &story.media_url {
                replies.push(Reply::Media {
                    url: url.clone(),
                    file_name: attachment_name("story", story.id.as_deref(), "mp4"),
                });
            }
        }
    }
    if stories.len() > limits::MAX_STORIES {
        replies.push(Reply::Text(render::stories_truncated(limits::MAX_STORIES, stories.len())));
    }
    replies
}

fn post_media(post: &crate::instagram::models::Post) -> Vec<Reply> {
    if post.is_carousel && !post.carousel_items.is_empty() {
        return post
            .carousel_items
            .iter()
            .take(limits::MAX_CAROUSEL_ITEMS)
            .enumerate()
            .filter_map(|(i, item)| {
                item.media_url().map(|url| Reply::Media {
                    url: url.to_string(),
                    file_name: format!("carousel_{}.{}", i, item.extension()),
                })
            })
            .collect();
    }

    let ext = if post.is_video() { "mp4" } else { "jpg" };
    post.media_urls
        .iter()
        .enumerate()
        .map(|(i, url)| Reply::Media {
            url: url.clone(),
            file_name: format!("post_{}.{}", i, ext),
        })
        .collect()
}

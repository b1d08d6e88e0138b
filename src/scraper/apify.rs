//! Apify actor client.
//!
//! Every lookup is one actor run:
//! 1. `POST /acts/<actor>/runs` starts the run (the server holds the request for
//!    up to `waitForFinish` seconds)
//! 2. `GET /actor-runs/<id>` is polled until the run reaches a terminal status
//!    or the client-side deadline passes
//! 3. `GET /actor-runs/<id>/dataset/items` returns the scraped items

use std::time::{Duration, Instant};

use futures_util::TryFutureExt;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::config;
use crate::core::retry::{retry, RetryConfig, Retryable};
use crate::instagram::models::{Post, Profile, Reel, Story};
use crate::scraper::error::ScraperError;
use crate::scraper::format::{format_post, format_profile, format_reel, format_stories};

const TERMINAL_STATUSES: &[&str] = &["SUCCEEDED", "FAILED", "ABORTED", "TIMED-OUT"];

#[derive(Debug, Clone, Deserialize)]
pub struct RunInfo {
    pub id: String,
    pub status: String,
}

impl RunInfo {
    pub fn is_terminal(&self) -> bool {
        TERMINAL_STATUSES.contains(&self.status.as_str())
    }

    pub fn succeeded(&self) -> bool {
        self.status == "SUCCEEDED"
    }
}

#[derive(Deserialize)]
struct RunEnvelope {
    data: RunInfo,
}

pub struct ApifyClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    poll_interval: Duration,
    max_wait: Duration,
    retry: RetryConfig,
}

pub fn profile_input(username: &str) -> Value {
    json!({ "usernames": [username] })
}

pub fn stories_input(username: &str) -> Value {
    json!({
        "usernames": [username],
        "includeUserInfo": true,
        "includeStickers": true
    })
}

pub fn reel_input(url: &str) -> Value {
    json!({ "reel_urls": [{ "url": url }] })
}

pub fn post_input(url: &str) -> Value {
    json!({ "instagram_urls": [url] })
}

impl ApifyClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ScraperError> {
        let http = reqwest::Client::builder()
            .timeout(config::network::timeout())
            .connect_timeout(config::network::connect_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            poll_interval: config::apify::poll_interval(),
            max_wait: config::apify::max_run_wait(),
            retry: RetryConfig::network(),
        })
    }

    /// Client from `APIFY_TOKEN` / `APIFY_BASE_URL`.
    pub fn from_env() -> Result<Self, ScraperError> {
        let token = config::APIFY_TOKEN
            .clone()
            .ok_or(ScraperError::NotConfigured("APIFY_TOKEN"))?;
        Self::new(config::APIFY_BASE_URL.as_str(), token)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub async fn profile(&self, username: &str) -> Result<Profile, ScraperError> {
        log::info!("Fetching profile for: {}", username);
        let items = self
            .run_actor(config::apify::PROFILE_ACTOR, &profile_input(username))
            .await?;
        let first = items.get(0).cloned().unwrap_or(Value::Null);
        Ok(format_profile(&first, username))
    }

    pub async fn stories(&self, username: &str) -> Result<Vec<Story>, ScraperError> {
        log::info!("Fetching stories for: {}", username);
        let items = self
            .run_actor(config::apify::STORIES_ACTOR, &stories_input(username))
            .await?;
        Ok(format_stories(&items))
    }

    pub async fn reel(&self, url: &str) -> Result<Option<Reel>, ScraperError> {
        log::info!("Fetching reel: {}", url);
        let items = self.run_actor(config::apify::REEL_ACTOR, &reel_input(url)).await?;
        Ok(format_reel(&items))
    }

    pub async fn post(&self, url: &str) -> Result<Option<Post>, ScraperError> {
        log::info!("Fetching post: {}", url);
        let items = self.run_actor(config::apify::POST_ACTOR, &post_input(url)).await?;
        Ok(format_post(&items))
    }

    /// Runs `actor` with `input` to completion and returns its dataset items.
    pub async fn run_actor(&self, actor: &str, input: &Value) -> Result<Value, ScraperError> {
        let run = self.start_run(actor, input).await?;
        log::debug!("Actor {} run {} started ({})", actor, run.id, run.status);

        let run = self.wait_for_run(run).await?;
        if !run.succeeded() {
            log::warn!("Actor {} run {} ended with {}", actor, run.id, run.status);
            return Err(ScraperError::RunFailed {
                run_id: run.id,
                status: run.status,
            });
        }

        self.dataset_items(&run.id).await
    }

    /// Starting a run is not idempotent: a request that reached Apify may have
    /// created a billed run even if the response was lost. Only connect errors,
    /// where nothing was sent, are retried.
    async fn start_run(&self, actor: &str, input: &Value) -> Result<RunInfo, ScraperError> {
        let url = format!("{}/acts/{}/runs", self.base_url, actor);
        let wait = config::apify::START_WAIT_SECS.to_string();
        let endpoint = format!("acts/{}/runs", actor);
        let endpoint = endpoint.as_str();
        let body = retry(&self.retry, endpoint, || {
            let request = self
                .http
                .post(&url)
                .query(&[("token", self.token.as_str()), ("waitForFinish", wait.as_str())])
                .json(input);
            send_once(endpoint, request).map_err(Unsent)
        })
        .await
        .map_err(|Unsent(e)| e)?;
        parse_run(body)
    }

    async fn get_run(&self, run_id: &str, wait_secs: u64) -> Result<RunInfo, ScraperError> {
        let url = format!("{}/actor-runs/{}", self.base_url, run_id);
        let wait = wait_secs.to_string();
        let body = self
            .send_json("actor-runs", || {
                self.http
                    .get(&url)
                    .query(&[("token", self.token.as_str()), ("waitForFinish", wait.as_str())])
            })
            .await?;
        parse_run(body)
    }

    /// Polls until the run is terminal. Gives up with `RunTimeout` after `max_wait`.
    async fn wait_for_run(&self, mut run: RunInfo) -> Result<RunInfo, ScraperError> {
        let started = Instant::now();
        while !run.is_terminal() {
            let elapsed = started.elapsed();
            if elapsed >= self.max_wait {
                return Err(ScraperError::RunTimeout {
                    run_id: run.id,
                    waited_secs: elapsed.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;

            let remaining = self.max_wait.saturating_sub(started.elapsed()).as_secs();
            run = self
                .get_run(&run.id, remaining.min(config::apify::POLL_WAIT_SECS))
                .await?;
            log::debug!("Run {} status: {}", run.id, run.status);
        }
        Ok(run)
    }

    async fn dataset_items(&self, run_id: &str) -> Result<Value, ScraperError> {
        let url = format!("{}/actor-runs/{}/dataset/items", self.base_url, run_id);
        let items = self
            .send_json("dataset/items", || {
                self.http
                    .get(&url)
                    .query(&[("token", self.token.as_str()), ("format", "json")])
            })
            .await?;
        if !items.is_array() {
            return Err(ScraperError::Decode(format!("dataset for run {} is not an array", run_id)));
        }
        Ok(items)
    }

    /// Sends the request built by `build` with retries on transient failures.
    ///
    /// `endpoint` is used in logs and errors; it never contains the token.
    async fn send_json<F>(&self, endpoint: &str, build: F) -> Result<Value, ScraperError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        retry(&self.retry, endpoint, || send_once(endpoint, build())).await
    }
}

async fn send_once(endpoint: &str, request: reqwest::RequestBuilder) -> Result<Value, ScraperError> {
    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ScraperError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp.json::<Value>().await?)
}

/// Error from a request that must only be repeated when it never left the client.
struct Unsent(ScraperError);

impl std::fmt::Display for Unsent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Retryable for Unsent {
    fn is_retryable(&self) -> bool {
        matches!(&self.0, ScraperError::Http(e) if e.is_connect())
    }
}

fn parse_run(body: Value) -> Result<RunInfo, ScraperError> {
    serde_json::from_value::<RunEnvelope>(body)
        .map(|env| env.data)
        .map_err(|e| ScraperError::Decode(format!("actor run response: {}", e)))
}

//! Exponential backoff for scraper API calls.
//!
//! Apify and RapidAPI both answer with 429 / 5xx under load. Calls go through
//! [`retry`], which re-runs the request while the error says it is transient
//! ([`Retryable`]) and the attempt budget allows.

use std::future::Future;
use std::time::{Duration, Instant};

/// Backoff schedule for one kind of call.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Adds up to 25% random delay so parallel commands do not retry in lockstep
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    #[must_use]
    pub fn no_jitter(mut self) -> Self {
        self.add_jitter = false;
        self
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_secs_f64());
        let jitter = if self.add_jitter {
            rand::random::<f64>() * 0.25 * capped
        } else {
            0.0
        };
        Duration::from_secs_f64(capped + jitter)
    }

    /// Apify actor calls: a run start is expensive, so wait a little longer.
    pub fn network() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(20),
            ..Self::default()
        }
    }

    /// RapidAPI lookups sit in front of a waiting user; give up quickly.
    pub fn quick() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            ..Self::default()
        }
    }
}

/// Classifies errors as transient.
pub trait Retryable {
    fn is_retryable(&self) -> bool;

    /// Server-provided wait, overriding the backoff schedule.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl Retryable for reqwest::Error {
    fn is_retryable(&self) -> bool {
        if self.is_timeout() || self.is_connect() {
            return true;
        }
        match self.status() {
            Some(status) => status.is_server_error() || status.as_u16() == 429,
            None => self.is_request(),
        }
    }
}

/// Runs `operation` until it succeeds, fails permanently, or runs out of retries.
///
/// Returns the last error on failure. `name` only appears in log lines.
pub async fn retry<F, Fut, T, E>(config: &RetryConfig, name: &str, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let started = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    log::info!("{} succeeded on attempt {}", name, attempt);
                }
                return Ok(value);
            }
            Err(e) if attempt <= config.max_retries && e.is_retryable() => {
                let delay = e
                    .retry_after()
                    .unwrap_or_else(|| config.delay_for_attempt(attempt - 1));
                log::warn!(
                    "{} attempt {}/{} failed, retrying in {:?}: {}",
                    name,
                    attempt,
                    config.max_retries + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if attempt > 1 {
                    log::error!(
                        "{} gave up after {} attempts in {:.1}s",
                        name,
                        attempt,
                        started.elapsed().as_secs_f64()
                    );
                }
                return Err(e);
            }
        }
    }
}

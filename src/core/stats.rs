//! Runtime counters shown by the `stats` command.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct BotStats {
    started_at: Instant,
    links_relayed: AtomicU64,
    downloads_failed: AtomicU64,
    commands_handled: AtomicU64,
    guilds: AtomicUsize,
}

impl Default for BotStats {
    fn default() -> Self {
        Self::new()
    }
}

impl BotStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            links_relayed: AtomicU64::new(0),
            downloads_failed: AtomicU64::new(0),
            commands_handled: AtomicU64::new(0),
            guilds: AtomicUsize::new(0),
        }
    }

    pub fn record_relay(&self) {
        self.links_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.downloads_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_command(&self) {
        self.commands_handled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_guilds(&self, count: usize) {
        self.guilds.store(count, Ordering::Relaxed);
    }

    pub fn links_relayed(&self) -> u64 {
        self.links_relayed.load(Ordering::Relaxed)
    }

    pub fn downloads_failed(&self) -> u64 {
        self.downloads_failed.load(Ordering::Relaxed)
    }

    pub fn commands_handled(&self) -> u64 {
        self.commands_handled.load(Ordering::Relaxed)
    }

    pub fn guilds(&self) -> usize {
        self.guilds.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn uptime_string(&self) -> String {
        format_uptime(self.uptime())
    }
}

/// `"{hours}h {minutes}m"`, hours unbounded.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}

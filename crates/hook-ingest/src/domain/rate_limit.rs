//! Fixed-window rate limiting per client identity.
//!
//! Each identity owns the instants of its recently admitted requests. A
//! request is admitted while fewer than `max_requests` of those instants fall
//! inside `[now - window, now]`. Expired instants are pruned lazily whenever
//! the identity is evaluated.
//!
//! One coarse mutex guards the whole map, so every read-modify-write for an
//! identity is linearized.

use crate::domain::config::RateLimitConfig;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Admitted-request history for one identity.
#[derive(Debug, Default)]
struct Window {
    admitted: VecDeque<Instant>,
}

impl Window {
    /// Drop instants older than `now - window`.
    fn prune(&mut self, now: Instant, window: Duration) {
        let Some(cutoff) = now.checked_sub(window) else {
            // Process younger than the window, nothing can be expired
            return;
        };
        while self.admitted.front().is_some_and(|t| *t < cutoff) {
            self.admitted.pop_front();
        }
    }

    fn last_seen(&self) -> Option<Instant> {
        self.admitted.back().copied()
    }
}

/// Fixed-window limiter shared across requests
pub struct FixedWindowLimiter {
    windows: Mutex<HashMap<String, Window>>,
    config: RateLimitConfig,
}

impl FixedWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit or reject one request from `identity` at `now`.
    pub fn admit(&self, identity: &str, now: Instant) -> bool {
        if !self.config.enabled {
            return true;
        }

        let mut windows = self.windows.lock();

        if !windows.contains_key(identity) && windows.len() >= self.config.max_tracked_identities {
            make_room(&mut windows, now, &self.config);
        }

        let window = windows.entry(identity.to_string()).or_insert_with(|| {
            debug!(identity = %identity, "Tracking new rate limit identity");
            Window::default()
        });

        window.prune(now, self.config.window);

        if window.admitted.len() >= self.config.max_requests as usize {
            return false;
        }

        window.admitted.push_back(now);
        true
    }

    /// Time until `identity` regains budget, zero when it has budget now.
    pub fn retry_after(&self, identity: &str, now: Instant) -> Duration {
        let windows = self.windows.lock();
        let Some(window) = windows.get(identity) else {
            return Duration::ZERO;
        };

        let live: Vec<Instant> = window
            .admitted
            .iter()
            .copied()
            .filter(|t| now.saturating_duration_since(*t) <= self.config.window)
            .collect();

        if live.len() < self.config.max_requests as usize {
            return Duration::ZERO;
        }

        // The slot frees once the oldest live instant leaves the window
        let oldest = live[live.len() - self.config.max_requests as usize];
        (oldest + self.config.window)
            .saturating_duration_since(now)
            .max(Duration::from_millis(1))
    }

    /// Forget identities whose windows have fully expired.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock();
        sweep_expired(&mut windows, now, self.config.window)
    }

    /// Number of identities currently held in memory.
    pub fn tracked_identities(&self) -> usize {
        self.windows.lock().len()
    }
}

fn sweep_expired(windows: &mut HashMap<String, Window>, now: Instant, window: Duration) -> usize {
    let before = windows.len();
    windows.retain(|identity, entry| {
        entry.prune(now, window);
        if entry.admitted.is_empty() {
            debug!(identity = %identity, "Removing idle rate limit identity");
            false
        } else {
            true
        }
    });
    before - windows.len()
}

/// Free one slot in a full map: sweep first, then evict the least recently
/// active identity.
fn make_room(windows: &mut HashMap<String, Window>, now: Instant, config: &RateLimitConfig) {
    if sweep_expired(windows, now, config.window) > 0
        && windows.len() < config.max_tracked_identities
    {
        return;
    }

    let stalest = windows
        .iter()
        .min_by_key(|(_, entry)| entry.last_seen())
        .map(|(identity, _)| identity.clone());

    if let Some(identity) = stalest {
        debug!(identity = %identity, "Evicting least recently active identity");
        windows.remove(&identity);
    }
}

/// Background task to sweep idle identities
pub async fn cleanup_task(limiter: Arc<FixedWindowLimiter>, interval: Duration) {
    let mut sweep_interval = tokio::time::interval(interval);
    sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        sweep_interval.tick().await;
        let removed = limiter.sweep(Instant::now());
        if removed > 0 {
            debug!(
                removed,
                remaining = limiter.tracked_identities(),
                "Swept idle rate limit identities"
            );
        }
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::error::Error;

/// Allowed number of admitted requests per rolling window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateBudget {
    pub limit: u32,
    pub window_secs: u64,
}

impl RateBudget {
    /// Longest window a budget may declare, one week
    pub const MAX_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

    pub const fn new(limit: u32, window_secs: u64) -> Self {
        Self { limit, window_secs }
    }

    /// The rolling window, clamped to [`Self::MAX_WINDOW_SECS`]
    pub fn window(&self) -> Duration {
        let secs = self.window_secs.min(Self::MAX_WINDOW_SECS);
        Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
    }
}

/// Outcome of one admission check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateDecision {
    /// Response headers describing the budget. The reset value is the unix
    /// time in milliseconds.
    pub fn headers(&self) -> [(&'static str, String); 3] {
        [
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            ("X-RateLimit-Reset", self.reset_at.timestamp_millis().to_string()),
        ]
    }
}

/// Shared counter backend for the rate governor.
///
/// Implementations must make check-and-record atomic per key: two
/// concurrent calls on the same key never both take the last slot.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn record_hit(
        &self,
        key: &str,
        budget: RateBudget,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, Box<dyn Error + Send + Sync>>;
}

/// Hits between two sweeps of expired keys
pub const DEFAULT_SWEEP_INTERVAL: u64 = 100;

/// Elapsed time after which the next hit sweeps expired keys
pub const DEFAULT_SWEEP_PERIOD_SECS: i64 = 60;

/// Upper bound on distinct keys held at once
pub const DEFAULT_MAX_TRACKED_KEYS: usize = 100_000;

#[derive(Debug)]
struct KeyWindow {
    span: Duration,
    events: VecDeque<DateTime<Utc>>,
}

impl KeyWindow {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.events.back().is_some_and(|last| *last > now - self.span)
    }
}

#[derive(Debug, Default)]
struct Windows {
    keys: HashMap<String, KeyWindow>,
    hits_since_sweep: u64,
    last_sweep: Option<DateTime<Utc>>,
}

impl Windows {
    fn sweep(&mut self, now: DateTime<Utc>) {
        self.keys.retain(|_, window| !window.is_expired(now));
        self.hits_since_sweep = 0;
        self.last_sweep = Some(now);
    }

    fn sweep_due(&self, now: DateTime<Utc>, interval: u64) -> bool {
        self.hits_since_sweep >= interval
            || self
                .last_sweep
                .is_some_and(|last| now - last >= Duration::seconds(DEFAULT_SWEEP_PERIOD_SECS))
    }
}

/// Process-local sliding window log, one deque of admission times per key.
///
/// Keys whose newest event has left their window are swept every
/// `sweep_interval` hits, and on the first hit after
/// [`DEFAULT_SWEEP_PERIOD_SECS`] without a sweep. A new key arriving while
/// `max_tracked_keys` are held forces a sweep and is denied if none frees up.
#[derive(Debug)]
pub struct InMemoryCounterStore {
    windows: Mutex<Windows>,
    sweep_interval: u64,
    max_tracked_keys: usize,
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SWEEP_INTERVAL, DEFAULT_MAX_TRACKED_KEYS)
    }
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(sweep_interval: u64, max_tracked_keys: usize) -> Self {
        Self {
            windows: Mutex::new(Windows::default()),
            sweep_interval: sweep_interval.max(1),
            max_tracked_keys,
        }
    }

    /// Drops keys whose windows hold no live events
    pub fn purge_idle(&self, now: DateTime<Utc>) {
        self.windows.lock().sweep(now);
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().keys.len()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn record_hit(
        &self,
        key: &str,
        budget: RateBudget,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, Box<dyn Error + Send + Sync>> {
        let window = budget.window();
        let mut windows = self.windows.lock();

        windows.hits_since_sweep += 1;
        if windows.last_sweep.is_none() {
            windows.last_sweep = Some(now);
        }
        if windows.sweep_due(now, self.sweep_interval) {
            windows.sweep(now);
        }

        if !windows.keys.contains_key(key) && windows.keys.len() >= self.max_tracked_keys {
            windows.sweep(now);
            if windows.keys.len() >= self.max_tracked_keys {
                tracing::warn!(key, tracked = windows.keys.len(), "rate limiter key table full");
                return Ok(RateDecision {
                    allowed: false,
                    limit: budget.limit,
                    remaining: 0,
                    reset_at: now + window,
                });
            }
        }

        let entry = windows.keys.entry(key.to_string()).or_insert_with(|| KeyWindow {
            span: window,
            events: VecDeque::new(),
        });
        entry.span = window;
        let events = &mut entry.events;

        let window_start = now - window;
        while events.front().is_some_and(|oldest| *oldest <= window_start) {
            events.pop_front();
        }

        let used = u32::try_from(events.len()).unwrap_or(u32::MAX);
        let allowed = used < budget.limit;
        if allowed {
            events.push_back(now);
        }

        let used = if allowed { used + 1 } else { used };
        let reset_at = events
            .front()
            .map(|oldest| *oldest + window)
            .unwrap_or(now + window);

        if events.is_empty() {
            windows.keys.remove(key);
        }

        Ok(RateDecision {
            allowed,
            limit: budget.limit,
            remaining: budget.limit.saturating_sub(used),
            reset_at,
        })
    }
}

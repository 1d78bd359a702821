//! Per-client fixed-window rate limiting.
//!
//! # Responsibilities
//! - Count requests per client key inside a fixed window
//! - Reject once the window quota is used up, with a retry-after hint
//! - Sweep expired entries so the key map stays bounded
//!
//! # Design Decisions
//! - Hard reset when a window expires (not sliding); a burst of up to
//!   2 × limit is possible across a window boundary
//! - Storage sits behind `RateLimitStore` so a shared backend can replace the
//!   in-process map without touching callers
//! - Quota is per process, not global

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { remaining: u32 },
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }
}

/// Storage for fixed-window counters.
///
/// `hit` must perform its read-modify-write atomically per key.
pub trait RateLimitStore: Send + Sync {
    /// Record one request for `key` at `now`.
    fn hit(&self, key: &str, now: Instant, limit: u32, window: Duration) -> Admission;

    /// Remove entries whose window expired before `now`. Returns the number removed.
    fn sweep(&self, now: Instant) -> usize;

    /// Number of tracked keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    window_reset_at: Instant,
}

impl WindowEntry {
    fn open(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            window_reset_at: now + window,
        }
    }
}

/// In-process store backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, WindowEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for MemoryStore {
    fn hit(&self, key: &str, now: Instant, limit: u32, window: Duration) -> Admission {
        // The shard lock is held for the whole read-modify-write.
        let mut entry = match self.entries.get_mut(key) {
            Some(entry) => entry,
            None => {
                self.entries
                    .entry(key.to_string())
                    .or_insert_with(|| WindowEntry { count: 0, window_reset_at: now + window })
            }
        };

        if entry.count == 0 || now > entry.window_reset_at {
            *entry = WindowEntry::open(now, window);
            return Admission::Admitted { remaining: limit.saturating_sub(1) };
        }

        if entry.count >= limit {
            return Admission::Rejected {
                retry_after: entry.window_reset_at.saturating_duration_since(now),
            };
        }

        entry.count += 1;
        Admission::Admitted { remaining: limit - entry.count }
    }

    fn sweep(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now <= entry.window_reset_at);
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Fixed-window limiter over an injected store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, limit: u32, window: Duration) -> Self {
        Self { store, limit, window }
    }

    /// In-process limiter from configuration.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            config.max_requests,
            Duration::from_millis(config.window_ms),
        )
    }

    /// Check and record a request for `key`.
    pub fn admit(&self, key: &str) -> Admission {
        self.admit_at(key, Instant::now())
    }

    /// Check and record a request for `key` at an explicit instant.
    pub fn admit_at(&self, key: &str, now: Instant) -> Admission {
        self.store.hit(key, now, self.limit, self.window)
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        self.store.sweep(now)
    }

    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("tracked_keys", &self.store.len())
            .finish()
    }
}

/// Periodically remove expired entries until shutdown.
pub fn spawn_sweeper(
    limiter: RateLimiter,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = limiter.sweep();
                    let remaining = limiter.tracked_keys();
                    metrics::record_rate_limit_entries(remaining);
                    if removed > 0 {
                        tracing::debug!(removed, remaining, "Swept expired rate limit entries");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Rate limit sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    })
}

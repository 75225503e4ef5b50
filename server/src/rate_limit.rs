//! In-memory rate limiting for credential endpoints.
//!
//! DESIGN
//! ======
//! Sliding-window counters backed by `HashMap<String, VecDeque<Instant>>`.
//! Two limits are enforced on sign-in and sign-up attempts:
//! - Per-key (normalized email): 10 attempts / 5 min
//! - Global: 300 attempts / min
//!
//! TRADE-OFFS
//! ==========
//! Counters live in process memory, so limits are per server instance and
//! reset on restart. Attempts are recorded before the password check, which
//! means successful logins count against the window too.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_PER_KEY_LIMIT: usize = 10;
const DEFAULT_PER_KEY_WINDOW_SECS: u64 = 300;

const DEFAULT_GLOBAL_LIMIT: usize = 300;
const DEFAULT_GLOBAL_WINDOW_SECS: u64 = 60;

/// Map size above which expired keys are swept.
const MAX_TRACKED_KEYS: usize = 10_000;

#[derive(Clone, Copy)]
struct RateLimitConfig {
    per_key_limit: usize,
    per_key_window: Duration,
    global_limit: usize,
    global_window: Duration,
}

impl RateLimitConfig {
    fn from_env() -> Self {
        let per_key_window_secs = env_parse("AUTH_RATE_WINDOW_SECS", DEFAULT_PER_KEY_WINDOW_SECS);
        let global_window_secs = env_parse("AUTH_RATE_GLOBAL_WINDOW_SECS", DEFAULT_GLOBAL_WINDOW_SECS);

        Self {
            per_key_limit: env_parse("AUTH_RATE_LIMIT", DEFAULT_PER_KEY_LIMIT),
            per_key_window: Duration::from_secs(per_key_window_secs),
            global_limit: env_parse("AUTH_RATE_GLOBAL", DEFAULT_GLOBAL_LIMIT),
            global_window: Duration::from_secs(global_window_secs),
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum RateLimitError {
    #[error("too many attempts for this account (max {limit} per {window_secs}s)")]
    PerKeyExceeded { limit: usize, window_secs: u64 },
    #[error("too many sign-in attempts (max {limit} per {window_secs}s)")]
    GlobalExceeded { limit: usize, window_secs: u64 },
}

// =============================================================================
// RATE LIMITER
// =============================================================================

#[derive(Clone)]
pub struct RateLimiter {
    inner: std::sync::Arc<Mutex<RateLimiterInner>>,
    config: RateLimitConfig,
}

struct RateLimiterInner {
    /// Attempt timestamps keyed by normalized email.
    key_attempts: HashMap<String, VecDeque<Instant>>,
    /// Attempt timestamps across all keys.
    global_attempts: VecDeque<Instant>,
}

impl RateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::from_env())
    }

    /// Limiter with an explicit per-key budget and default global limit.
    #[cfg(test)]
    pub(crate) fn with_limits(per_key_limit: usize, per_key_window: Duration) -> Self {
        Self::with_config(RateLimitConfig {
            per_key_limit,
            per_key_window,
            global_limit: DEFAULT_GLOBAL_LIMIT,
            global_window: Duration::from_secs(DEFAULT_GLOBAL_WINDOW_SECS),
        })
    }

    fn with_config(config: RateLimitConfig) -> Self {
        Self {
            inner: std::sync::Arc::new(Mutex::new(RateLimiterInner {
                key_attempts: HashMap::new(),
                global_attempts: VecDeque::new(),
            })),
            config,
        }
    }

    /// Check both per-key and global limits, then record the attempt.
    ///
    /// # Errors
    ///
    /// Returns which limit was hit; the attempt is not recorded in that case.
    pub fn check_and_record(&self, key: &str) -> Result<(), RateLimitError> {
        self.check_and_record_at(key, Instant::now())
    }

    /// Internal: check + record with explicit timestamp (for testing).
    fn check_and_record_at(&self, key: &str, now: Instant) -> Result<(), RateLimitError> {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let cfg = self.config;

        prune_window(&mut inner.global_attempts, now, cfg.global_window);
        if inner.global_attempts.len() >= cfg.global_limit {
            return Err(RateLimitError::GlobalExceeded {
                limit: cfg.global_limit,
                window_secs: cfg.global_window.as_secs(),
            });
        }

        let key_deque = inner.key_attempts.entry(key.to_owned()).or_default();
        prune_window(key_deque, now, cfg.per_key_window);
        if key_deque.len() >= cfg.per_key_limit {
            return Err(RateLimitError::PerKeyExceeded {
                limit: cfg.per_key_limit,
                window_secs: cfg.per_key_window.as_secs(),
            });
        }

        key_deque.push_back(now);
        inner.global_attempts.push_back(now);

        // Drop keys whose windows emptied out so the map does not grow unbounded.
        if inner.key_attempts.len() > MAX_TRACKED_KEYS {
            let window = cfg.per_key_window;
            inner.key_attempts.retain(|_, attempts| {
                prune_window(attempts, now, window);
                !attempts.is_empty()
            });
        }

        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) > window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;

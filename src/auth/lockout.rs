//! Login-attempt throttling, keyed by client identifier.
//!
//! Failed attempts are tracked per client key in an explicit map with TTL
//! eviction: entries older than the lockout window are dropped whenever the
//! tracker is consulted, so stale counters never accumulate for the life of
//! the process.

use std::collections::HashMap;

use time::{Duration, OffsetDateTime};

/// How many failed attempts are allowed before a client is locked out.
pub const LOGIN_ATTEMPT_LIMIT: u32 = 5;

/// How long a locked-out client must wait, and how long stale failure
/// counters are kept.
pub const LOCKOUT_DURATION: Duration = Duration::minutes(30);

#[derive(Debug, Clone, Copy, PartialEq)]
struct AttemptRecord {
    failures: u32,
    last_failure: OffsetDateTime,
}

/// Tracks failed log-in attempts per client key.
///
/// All methods take `now` explicitly so the TTL behaviour is testable.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginAttemptTracker {
    attempts: HashMap<String, AttemptRecord>,
    limit: u32,
    ttl: Duration,
}

impl Default for LoginAttemptTracker {
    fn default() -> Self {
        Self::new(LOGIN_ATTEMPT_LIMIT, LOCKOUT_DURATION)
    }
}

impl LoginAttemptTracker {
    /// Create a tracker allowing `limit` failures before locking a key out
    /// for `ttl`.
    pub fn new(limit: u32, ttl: Duration) -> Self {
        Self {
            attempts: HashMap::new(),
            limit,
            ttl,
        }
    }

    fn evict_expired(&mut self, now: OffsetDateTime) {
        self.attempts
            .retain(|_, record| now - record.last_failure < self.ttl);
    }

    /// Whether `key` has exhausted its attempts and is still inside the
    /// lockout window.
    pub fn is_locked(&mut self, key: &str, now: OffsetDateTime) -> bool {
        self.evict_expired(now);

        self.attempts
            .get(key)
            .is_some_and(|record| record.failures >= self.limit)
    }

    /// Record a failed attempt for `key`.
    pub fn record_failure(&mut self, key: &str, now: OffsetDateTime) {
        self.evict_expired(now);

        self.attempts
            .entry(key.to_owned())
            .and_modify(|record| {
                record.failures += 1;
                record.last_failure = now;
            })
            .or_insert(AttemptRecord {
                failures: 1,
                last_failure: now,
            });
    }

    /// Clear the failure counter for `key` after a successful log-in.
    pub fn record_success(&mut self, key: &str) {
        self.attempts.remove(key);
    }

    /// How many more failures `key` can make before being locked out.
    pub fn remaining_attempts(&self, key: &str) -> u32 {
        let failures = self
            .attempts
            .get(key)
            .map(|record| record.failures)
            .unwrap_or(0);

        self.limit.saturating_sub(failures)
    }
}

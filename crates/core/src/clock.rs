// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time abstraction so the control plane's timers, backoffs, and cache TTLs
//! can be driven deterministically in tests instead of by wall-clock time.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of time for every timed component. Implementations must be cheap to
/// clone and safe to share across threads.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Milliseconds since the Unix epoch, used for persisted timestamps
    /// (`updatedAt`, cache entry ages, etc).
    fn now_ms(&self) -> i64;

    /// Monotonic-ish elapsed-time anchor, used for in-process interval math
    /// (restart backoff, circuit breaker windows). Not persisted.
    fn now_monotonic_ms(&self) -> u64;
}

/// Real wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    fn now_monotonic_ms(&self) -> u64 {
        // `Instant` isn't constructible from a fixed epoch, so for the
        // monotonic anchor we fall back to the same wall-clock source; tests
        // that need tight control over elapsed time use `FakeClock` instead.
        self.now_ms().max(0) as u64
    }
}

/// Deterministic clock for tests: starts at a fixed instant and only moves
/// forward when explicitly advanced.
#[derive(Debug, Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<i64>>,
}

impl FakeClock {
    /// Construct a clock starting at the given epoch-ms timestamp.
    pub fn at(start_ms: i64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(start_ms)),
        }
    }

    /// Advance the clock by `d`, returning the new timestamp.
    pub fn advance(&self, d: Duration) -> i64 {
        let mut guard = self.inner.lock();
        *guard += d.as_millis() as i64;
        *guard
    }

    /// Set the clock to an absolute timestamp.
    pub fn set(&self, ms: i64) {
        *self.inner.lock() = ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::at(0)
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> i64 {
        *self.inner.lock()
    }

    fn now_monotonic_ms(&self) -> u64 {
        (*self.inner.lock()).max(0) as u64
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;

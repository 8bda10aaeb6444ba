// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Circuit Breaker (spec §4.3): protects against rapid failure bursts
//! independent of event dedup. Trips on ≥5 failures inside a rolling 60s
//! window, pausing failure handling for 5 minutes.

use bosun_core::Clock;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

const WINDOW_MS: i64 = 60_000;
const TRIP_THRESHOLD: usize = 5;
const PAUSE_MS: i64 = 5 * 60 * 1000;

struct Inner {
    failures: VecDeque<i64>,
    tripped: bool,
    reset_at_ms: Option<i64>,
    /// Latches so the "exactly one summary notification" invariant holds
    /// across repeated `record_event` calls while already tripped.
    notified_this_trip: bool,
}

/// Tracks a rolling window of failure timestamps and trips into a global
/// pause when they cluster too tightly.
pub struct CircuitBreaker<C: Clock> {
    clock: C,
    inner: Mutex<Inner>,
}

/// Outcome of recording a failure event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripOutcome {
    /// Count of failures currently inside the window (after this one).
    pub count: usize,
    /// `true` the first time this call causes a trip; callers use this to
    /// gate the single summary notification.
    pub just_tripped: bool,
}

impl<C: Clock> CircuitBreaker<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            inner: Mutex::new(Inner {
                failures: VecDeque::new(),
                tripped: false,
                reset_at_ms: None,
                notified_this_trip: false,
            }),
        }
    }

    /// Record a failure event, pruning entries outside the rolling window.
    /// Returns the outcome; if `isTripped()` was already true and the pause
    /// has not elapsed, does not admit new failures into the count (trip is
    /// idempotent per spec §5 "Circuit-breaker trip is idempotent").
    pub fn record_event(&self) -> TripOutcome {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();

        if inner.tripped {
            if let Some(reset_at) = inner.reset_at_ms {
                if now < reset_at {
                    return TripOutcome {
                        count: inner.failures.len(),
                        just_tripped: false,
                    };
                }
            }
            Self::reset_locked(&mut inner);
        }

        inner.failures.push_back(now);
        while let Some(&front) = inner.failures.front() {
            if now - front >= WINDOW_MS {
                inner.failures.pop_front();
            } else {
                break;
            }
        }

        let count = inner.failures.len();
        if count >= TRIP_THRESHOLD {
            inner.tripped = true;
            inner.reset_at_ms = Some(now + PAUSE_MS);
            let just_tripped = !inner.notified_this_trip;
            inner.notified_this_trip = true;
            return TripOutcome { count, just_tripped };
        }
        TripOutcome {
            count,
            just_tripped: false,
        }
    }

    pub fn is_tripped(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.tripped {
            if let Some(reset_at) = inner.reset_at_ms {
                if self.clock.now_ms() >= reset_at {
                    Self::reset_locked(&mut inner);
                    return false;
                }
            }
            return true;
        }
        false
    }

    /// Force a trip regardless of the rolling window, used when a caller
    /// already knows `count` failures warrant one (e.g. replaying state).
    pub fn trip(&self, count: usize) {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();
        inner.tripped = true;
        inner.reset_at_ms = Some(now + PAUSE_MS);
        inner.failures = (0..count).map(|_| now).collect();
        inner.notified_this_trip = true;
    }

    pub fn pause_duration() -> Duration {
        Duration::from_millis(PAUSE_MS as u64)
    }

    fn reset_locked(inner: &mut Inner) {
        inner.failures.clear();
        inner.tripped = false;
        inner.reset_at_ms = None;
        inner.notified_this_trip = false;
    }
}

#[cfg(test)]
#[path = "circuit_breaker_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer identifiers and the budget-clamping rule every timer caller must
//! apply before scheduling (spec §9: "Timer budget clamping").

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifies a scheduled timer (restart delay, cooldown, digest flush, …).
    pub struct TimerId;
}

/// The largest delay, in milliseconds, any timer caller may request. Mirrors
/// the largest value `setTimeout` accepts in the original implementation
/// (`2^31 - 1`), carried over here as the hard ceiling every safe-timer
/// wrapper clamps to.
pub const MAX_TIMER_DELAY_MS: i64 = i32::MAX as i64;

/// Clamp a requested delay into `[0, MAX_TIMER_DELAY_MS]`, returning the
/// clamped value. Negative or out-of-range requests are clamped rather than
/// rejected: a caller computing a delay from untrusted arithmetic (e.g.
/// `strikes * backoff`) should never be able to wedge a timer.
pub fn clamp_timer_delay_ms(requested_ms: i64) -> u64 {
    requested_ms.clamp(0, MAX_TIMER_DELAY_MS) as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClampedDelay {
    pub requested_ms: i64,
    pub clamped_ms: u64,
    pub was_clamped: bool,
}

/// Clamp and report whether clamping actually changed the value, so callers
/// can log a warning exactly as spec §9 requires ("clamps and logs
/// out-of-range values").
pub fn clamp_and_report(requested_ms: i64) -> ClampedDelay {
    let clamped_ms = clamp_timer_delay_ms(requested_ms);
    ClampedDelay {
        requested_ms,
        clamped_ms,
        was_clamped: clamped_ms as i64 != requested_ms,
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;

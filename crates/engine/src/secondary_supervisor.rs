// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secondary Supervisor Loop, the "monitor-monitor" (spec §4.9): an
//! independent periodic task that packages recent digest/log context into a
//! prompt and runs it through the primary LLM SDK to self-heal the control
//! plane. This module owns the SDK-slot rotation/exclusion bookkeeping, the
//! single-cycle-at-a-time guard, and the watchdog force-reset; the prompt
//! construction and SDK invocation live in `bosun-daemon` where the real
//! client is wired in.

use bosun_core::Clock;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

const EXCLUDE_AFTER_5_MS: i64 = 15 * 60 * 1000;
const EXCLUDE_AFTER_10_MS: i64 = 60 * 60 * 1000;

#[derive(Debug, Clone)]
pub struct SdkSlot {
    pub name: String,
    pub cumulative_failures: u32,
    pub excluded_until_ms: Option<i64>,
}

impl SdkSlot {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cumulative_failures: 0,
            excluded_until_ms: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SecondarySupervisorConfig {
    pub interval_ms: i64,
    pub timeout_ms: i64,
    pub status_interval_ms: i64,
    pub startup_delay_ms: i64,
    pub status_delay_ms: i64,
    pub watchdog_abort_limit: u32,
}

impl Default for SecondarySupervisorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5 * 60 * 1000,
            timeout_ms: 2 * 60 * 1000,
            status_interval_ms: 30 * 60 * 1000,
            startup_delay_ms: 15_000,
            status_delay_ms: 20_000,
            watchdog_abort_limit: 2,
        }
    }
}

impl SecondarySupervisorConfig {
    /// The watchdog aborts a run exceeding `timeoutMs + 60s` (spec §4.9).
    pub fn watchdog_deadline_ms(&self) -> i64 {
        self.timeout_ms + 60_000
    }

    /// If the first status publish would land before the first cycle, push
    /// it out to at least 2s after the cycle starts.
    pub fn adjusted_status_delay_ms(&self) -> i64 {
        self.status_delay_ms.max(self.startup_delay_ms + 2_000)
    }
}

/// Rotation/exclusion state plus the single-flight cycle guard.
pub struct SecondarySupervisor<C: Clock> {
    clock: C,
    config: SecondarySupervisorConfig,
    slots: Mutex<Vec<SdkSlot>>,
    current_index: AtomicUsize,
    running: AtomicBool,
    watchdog_aborts: AtomicU32,
}

impl<C: Clock> SecondarySupervisor<C> {
    pub fn new(clock: C, config: SecondarySupervisorConfig, slot_names: &[&str]) -> Self {
        let slots = slot_names.iter().map(|n| SdkSlot::new(*n)).collect();
        Self {
            clock,
            config,
            slots: Mutex::new(slots),
            current_index: AtomicUsize::new(0),
            running: AtomicBool::new(false),
            watchdog_aborts: AtomicU32::new(0),
        }
    }

    pub fn config(&self) -> &SecondarySupervisorConfig {
        &self.config
    }

    /// Record a retryable failure against `slot_name`, excluding it once it
    /// crosses the 5- or 10-failure cumulative thresholds.
    pub fn record_failure(&self, slot_name: &str) {
        let now = self.clock.now_ms();
        let mut slots = self.slots.lock();
        let Some(slot) = slots.iter_mut().find(|s| s.name == slot_name) else {
            return;
        };
        slot.cumulative_failures += 1;
        if slot.cumulative_failures >= 10 {
            slot.excluded_until_ms = Some(now + EXCLUDE_AFTER_10_MS);
        } else if slot.cumulative_failures >= 5 {
            slot.excluded_until_ms = Some(now + EXCLUDE_AFTER_5_MS);
        }
    }

    /// Picks the next slot to try, rotating past excluded slots. If every
    /// slot is currently excluded, the primary (index 0) is force-included.
    pub fn next_slot(&self) -> String {
        let now = self.clock.now_ms();
        let slots = self.slots.lock();
        let len = slots.len();
        if len == 0 {
            return String::new();
        }
        let start = self.current_index.load(Ordering::SeqCst);
        for offset in 1..=len {
            let idx = (start + offset) % len;
            let slot = &slots[idx];
            let excluded = slot.excluded_until_ms.is_some_and(|until| now < until);
            if !excluded {
                self.current_index.store(idx, Ordering::SeqCst);
                return slot.name.clone();
            }
        }
        self.current_index.store(0, Ordering::SeqCst);
        slots[0].name.clone()
    }

    /// Acquire the single-cycle-at-a-time guard. Returns `false` if a cycle
    /// is already running.
    pub fn try_begin_cycle(&self) -> bool {
        !self.running.swap(true, Ordering::SeqCst)
    }

    /// A cycle finished cleanly; release the guard and reset the watchdog
    /// abort counter.
    pub fn end_cycle(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.watchdog_aborts.store(0, Ordering::SeqCst);
    }

    /// The watchdog timed out a run. Returns `true` if this abort force-reset
    /// the `running` flag (two aborts without an intervening clean stop).
    pub fn watchdog_abort(&self) -> bool {
        let aborts = self.watchdog_aborts.fetch_add(1, Ordering::SeqCst) + 1;
        if aborts >= self.config.watchdog_abort_limit {
            self.running.store(false, Ordering::SeqCst);
            self.watchdog_aborts.store(0, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "secondary_supervisor_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restart Controller (spec §4.2, §3 `RestartState`): mutex-aware backoff,
//! quick-exit detection, and minimum restart interval. State is purely
//! in-memory — it resets every process start by design, unlike the
//! persistent caches in `bosun-storage`.

use bosun_core::Clock;
use parking_lot::Mutex;
use std::time::Duration;

const QUICK_EXIT_THRESHOLD_MS: i64 = 20_000;
const MIN_RESTART_INTERVAL_MS: i64 = 15_000;
const BASE_MUTEX_BACKOFF_MS: i64 = 2_000;
const MAX_MUTEX_BACKOFF_MS: i64 = 60_000;

/// Mirrors spec §3 `RestartState`.
#[derive(Debug, Clone, Copy)]
struct RestartState {
    last_process_start_at_ms: Option<i64>,
    consecutive_quick_exits: u32,
    mutex_backoff_ms: i64,
    mutex_held_detected: bool,
    last_exit_was_mutex_held: bool,
}

impl Default for RestartState {
    fn default() -> Self {
        Self {
            last_process_start_at_ms: None,
            consecutive_quick_exits: 0,
            mutex_backoff_ms: BASE_MUTEX_BACKOFF_MS,
            mutex_held_detected: false,
            last_exit_was_mutex_held: false,
        }
    }
}

/// Outcome of recording a child exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitState {
    pub was_quick_exit: bool,
    pub mutex_held: bool,
    pub backoff_ms: i64,
}

pub struct RestartController<C: Clock> {
    clock: C,
    state: Mutex<RestartState>,
}

impl<C: Clock> RestartController<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: Mutex::new(RestartState::default()),
        }
    }

    pub fn note_process_started(&self) {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();
        state.last_process_start_at_ms = Some(now);
        state.mutex_held_detected = false;
    }

    /// Record a child exit and update quick-exit/backoff bookkeeping.
    pub fn record_exit(&self, run_duration: Duration) -> ExitState {
        let run_ms = run_duration.as_millis() as i64;
        let mut state = self.state.lock();
        let mutex_held = state.mutex_held_detected;
        let was_quick_exit = run_ms < QUICK_EXIT_THRESHOLD_MS;

        if was_quick_exit {
            state.consecutive_quick_exits += 1;
            if mutex_held {
                state.mutex_backoff_ms =
                    (state.mutex_backoff_ms * 2).min(MAX_MUTEX_BACKOFF_MS);
            }
        } else {
            state.consecutive_quick_exits = 0;
            state.mutex_backoff_ms = BASE_MUTEX_BACKOFF_MS;
        }
        state.last_exit_was_mutex_held = mutex_held;
        state.mutex_held_detected = false;

        ExitState {
            was_quick_exit,
            mutex_held,
            backoff_ms: state.mutex_backoff_ms,
        }
    }

    /// `max(0, 15s - (now - lastProcessStartAt))`.
    pub fn get_min_restart_delay(&self) -> Duration {
        let now = self.clock.now_ms();
        let state = self.state.lock();
        let elapsed = state
            .last_process_start_at_ms
            .map(|start| now - start)
            .unwrap_or(MIN_RESTART_INTERVAL_MS);
        let remaining = (MIN_RESTART_INTERVAL_MS - elapsed).max(0);
        Duration::from_millis(remaining as u64)
    }

    /// `true` while a mutex backoff is outstanding and `reason` is
    /// `"file-change"` — prevents file-change restarts from short-circuiting
    /// mutex backoff.
    pub fn should_suppress_restart(&self, reason: &str) -> bool {
        if reason != "file-change" {
            return false;
        }
        self.state.lock().last_exit_was_mutex_held
    }

    /// Scan a child log line for the "another instance" marker, latching a
    /// flag consulted by the next `record_exit`.
    pub fn note_log_line(&self, line: &str) {
        if line.contains("another instance is already running")
            || line.contains("Another orchestrator instance is already running")
        {
            self.state.lock().mutex_held_detected = true;
        }
    }

    pub fn consecutive_quick_exits(&self) -> u32 {
        self.state.lock().consecutive_quick_exits
    }
}

#[cfg(test)]
#[path = "restart_controller_tests.rs"]
mod tests;

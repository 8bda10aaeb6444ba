// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loop detector (spec §4.8): per normalized error fingerprint, tracks
//! occurrence timestamps within a 10-minute window. Fires one autofix
//! event per fingerprint when occurrences cross the threshold and no fix
//! has been triggered for it in the last 15 minutes.

use bosun_core::Clock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::VecDeque;

const WINDOW_MS: i64 = 10 * 60 * 1000;
const TRIGGER_THRESHOLD: usize = 4;
const FIX_COOLDOWN_MS: i64 = 15 * 60 * 1000;

#[derive(Default)]
struct FingerprintState {
    occurrences: VecDeque<i64>,
    last_fix_at_ms: Option<i64>,
}

pub struct LoopDetector<C: Clock> {
    clock: C,
    state: Mutex<HashMap<String, FingerprintState>>,
}

impl<C: Clock> LoopDetector<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Register an occurrence of `fingerprint`. Returns `true` exactly once
    /// per crossing of the threshold (i.e. the caller should fire an
    /// autofix event for this fingerprint).
    pub fn record(&self, fingerprint: &str) -> bool {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();
        let entry = state.entry(fingerprint.to_string()).or_default();

        entry.occurrences.push_back(now);
        while let Some(&front) = entry.occurrences.front() {
            if now - front > WINDOW_MS {
                entry.occurrences.pop_front();
            } else {
                break;
            }
        }

        let cooled_down = entry
            .last_fix_at_ms
            .is_none_or(|last| now - last >= FIX_COOLDOWN_MS);

        if entry.occurrences.len() >= TRIGGER_THRESHOLD && cooled_down {
            entry.last_fix_at_ms = Some(now);
            return true;
        }
        false
    }

    pub fn occurrence_count(&self, fingerprint: &str) -> usize {
        self.state
            .lock()
            .get(fingerprint)
            .map(|s| s.occurrences.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "loop_detector_tests.rs"]
mod tests;

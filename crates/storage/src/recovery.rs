// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RecoveryState cache: per-task strike counter and skip-cache disposition
//! (spec §3 "RecoveryState", §4.4 steps 1-3, §4.6 "RecoverySkip"/"StaleStrike"
//! rows, §6 `task-recovery-cache.json`). Backed by a single file since both
//! roles key off the same task id and invalidate on the same rule
//! (`updatedAt` mismatch).

use crate::ttl::TtlVersionedCache;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const TTL_MS: i64 = 30 * 60 * 1000;
const MAX_ENTRIES: usize = 2000;

/// The skip-cache disposition recorded once a task's recovery path has been
/// resolved, so repeated sweeps don't re-derive (or re-log) the same outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedStatus {
    Todo,
    Cancelled,
    Done,
    FetchFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryState {
    /// Consecutive sweeps that found no branch/PR for this task.
    pub strikes: u32,
    pub last_check_at_ms: i64,
    pub resolved_status: Option<ResolvedStatus>,
}

#[derive(Clone)]
pub struct RecoveryCache {
    inner: TtlVersionedCache<RecoveryState>,
}

impl RecoveryCache {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: TtlVersionedCache::load(path, MAX_ENTRIES, TTL_MS),
        }
    }

    /// The current strike/skip state for `task_id`, or `None` if no entry
    /// exists or it was invalidated (version mismatch / TTL elapsed).
    pub fn get(&self, task_id: &str, task_version: i64, now_ms: i64) -> Option<RecoveryState> {
        self.inner.get_valid(task_id, task_version, now_ms)
    }

    /// Increment the strike counter for a sweep that found nothing,
    /// returning the new count.
    pub fn record_strike(&self, task_id: &str, task_version: i64, now_ms: i64) -> u32 {
        let strikes = self
            .get(task_id, task_version, now_ms)
            .map(|s| s.strikes)
            .unwrap_or(0)
            + 1;
        self.inner.set(
            task_id,
            RecoveryState {
                strikes,
                last_check_at_ms: now_ms,
                resolved_status: None,
            },
            task_version,
            now_ms,
        );
        strikes
    }

    /// Record a terminal skip disposition (the recovery path was resolved;
    /// don't re-attempt until TTL or a task-version change).
    pub fn record_skip(
        &self,
        task_id: &str,
        resolved_status: ResolvedStatus,
        task_version: i64,
        now_ms: i64,
    ) {
        self.inner.set(
            task_id,
            RecoveryState {
                strikes: 0,
                last_check_at_ms: now_ms,
                resolved_status: Some(resolved_status),
            },
            task_version,
            now_ms,
        );
    }

    pub fn clear(&self, task_id: &str) {
        self.inner.clear(task_id);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;

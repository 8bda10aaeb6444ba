// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ConflictCooldownCache (spec §4.6 "ConflictCooldown" row): per-task
//! cooldown after a merge conflict, so the reconciler doesn't hammer a
//! conflicted branch every sweep. TTL 30m, unbounded, cleared the moment a
//! resolution attempt succeeds.

use crate::ttl::TtlVersionedCache;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const TTL_MS: i64 = 30 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictState {
    pub attempts: u32,
    pub cooldown_until_ms: i64,
}

#[derive(Clone)]
pub struct ConflictCooldownCache {
    inner: TtlVersionedCache<ConflictState>,
}

impl ConflictCooldownCache {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: TtlVersionedCache::load_unbounded(path, TTL_MS),
        }
    }

    /// `true` while `now_ms` is still inside a previously recorded cooldown
    /// window for this task.
    pub fn in_cooldown(&self, task_id: &str, task_version: i64, now_ms: i64) -> bool {
        self.inner
            .get_valid(task_id, task_version, now_ms)
            .is_some_and(|s| now_ms < s.cooldown_until_ms)
    }

    /// Record a failed conflict-resolution attempt and start (or extend)
    /// the cooldown window.
    pub fn record_conflict(
        &self,
        task_id: &str,
        task_version: i64,
        cooldown_ms: i64,
        now_ms: i64,
    ) -> u32 {
        let attempts = self
            .inner
            .get_valid(task_id, task_version, now_ms)
            .map(|s| s.attempts)
            .unwrap_or(0)
            + 1;
        self.inner.set(
            task_id,
            ConflictState {
                attempts,
                cooldown_until_ms: now_ms + cooldown_ms,
            },
            task_version,
            now_ms,
        );
        attempts
    }

    /// Resolution succeeded: clear the cooldown entirely.
    pub fn resolved(&self, task_id: &str) {
        self.inner.clear(task_id);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
#[path = "conflict_cooldown_tests.rs"]
mod tests;

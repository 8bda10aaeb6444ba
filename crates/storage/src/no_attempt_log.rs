// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! NoAttemptLogCache (spec §4.6 "NoAttemptLog" row): memo of "already logged
//! a warning that this task has no attempts" so the reconciler doesn't
//! re-log every sweep. TTL 30m, max 2000, invalidated when the reason for
//! the warning changes.

use crate::ttl::TtlVersionedCache;
use std::path::PathBuf;

const TTL_MS: i64 = 30 * 60 * 1000;
const MAX_ENTRIES: usize = 2000;

#[derive(Clone)]
pub struct NoAttemptLogCache {
    inner: TtlVersionedCache<String>,
}

impl NoAttemptLogCache {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: TtlVersionedCache::load(path, MAX_ENTRIES, TTL_MS),
        }
    }

    /// `reason` is encoded as the "task version" slot of the underlying
    /// cache: a changed reason string hashes differently and so misses,
    /// which is exactly the invalidation rule the spec calls for.
    pub fn already_logged(&self, task_id: &str, reason: &str, now_ms: i64) -> bool {
        self.inner
            .get_valid(task_id, reason_key(reason), now_ms)
            .is_some()
    }

    pub fn record(&self, task_id: &str, reason: &str, now_ms: i64) {
        self.inner
            .set(task_id, reason.to_string(), reason_key(reason), now_ms);
    }

    pub fn clear(&self, task_id: &str) {
        self.inner.clear(task_id);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

fn reason_key(reason: &str) -> i64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    reason.hash(&mut hasher);
    hasher.finish() as i64
}

#[cfg(test)]
#[path = "no_attempt_log_tests.rs"]
mod tests;

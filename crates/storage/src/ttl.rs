// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared shape for the task-scoped caches in spec §4.6 (RecoverySkip,
//! StaleStrike, NoAttemptLog, ConflictCooldown): TTL'd, bounded, and
//! invalidated whenever the task's `updatedAt` no longer matches the
//! version the entry was written against.

use crate::cache::PersistentCache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionedEntry<V> {
    pub value: V,
    pub written_at_ms: i64,
    /// The task's `updatedAt` at write time; a mismatch on read means the
    /// task changed underneath the cache entry and it must be evicted.
    pub task_version: i64,
}

/// A `PersistentCache` specialized for entries that carry a TTL and a task
/// version, matching the RecoverySkip/StaleStrike/NoAttemptLog/
/// ConflictCooldown rows of spec §4.6's cache table.
#[derive(Clone)]
pub struct TtlVersionedCache<V> {
    cache: PersistentCache<VersionedEntry<V>>,
    ttl_ms: i64,
}

impl<V> TtlVersionedCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn load(path: impl Into<PathBuf>, max_size: usize, ttl_ms: i64) -> Self {
        Self {
            cache: PersistentCache::load(path).with_max_size(max_size),
            ttl_ms,
        }
    }

    /// Like `load`, but with no bound on entry count (used by caches whose
    /// spec eviction column is "—", e.g. ConflictCooldown).
    pub fn load_unbounded(path: impl Into<PathBuf>, ttl_ms: i64) -> Self {
        Self {
            cache: PersistentCache::load(path),
            ttl_ms,
        }
    }

    /// Fetch a still-valid entry for `key`, evicting (and returning `None`)
    /// if the task version no longer matches or the TTL has elapsed.
    pub fn get_valid(&self, key: &str, current_task_version: i64, now_ms: i64) -> Option<V> {
        let entry = self.cache.get(key)?;
        if entry.task_version != current_task_version {
            self.cache.remove(key);
            return None;
        }
        if now_ms - entry.written_at_ms > self.ttl_ms {
            self.cache.remove(key);
            return None;
        }
        Some(entry.value)
    }

    pub fn set(&self, key: impl Into<String>, value: V, task_version: i64, now_ms: i64) {
        self.cache.insert(
            key.into(),
            VersionedEntry {
                value,
                written_at_ms: now_ms,
                task_version,
            },
        );
    }

    pub fn clear(&self, key: &str) {
        self.cache.remove(key);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn save_now(&self) -> Result<(), crate::cache::CacheError> {
        self.cache.save_now()
    }
}

#[cfg(test)]
#[path = "ttl_tests.rs"]
mod tests;

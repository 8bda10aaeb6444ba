// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! EpicMergeCache (spec §4.6 "EpicMerge" row): memo keyed on `head::base`
//! branch pairs tracking the last known merge/rebase status between an
//! epic's child branch and its parent, invalidated whenever that status
//! changes.

use crate::cache::PersistentCache;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpicMergeStatus {
    Pending,
    Merged,
    Conflicted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EpicMergeEntry {
    status: EpicMergeStatus,
    checked_at_ms: i64,
}

#[derive(Clone)]
pub struct EpicMergeCache {
    cache: PersistentCache<EpicMergeEntry>,
}

fn key(head: &str, base: &str) -> String {
    format!("{head}::{base}")
}

impl EpicMergeCache {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        Self {
            cache: PersistentCache::load(path),
        }
    }

    pub fn get(&self, head: &str, base: &str) -> Option<EpicMergeStatus> {
        self.cache.get(&key(head, base)).map(|e| e.status)
    }

    /// Record a new status, implicitly invalidating whatever was there
    /// before (the spec's "status change" invalidation rule is just an
    /// overwrite since the cache only ever holds the latest status).
    pub fn set(&self, head: &str, base: &str, status: EpicMergeStatus, now_ms: i64) {
        self.cache.insert(
            key(head, base),
            EpicMergeEntry {
                status,
                checked_at_ms: now_ms,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
#[path = "epic_merge_tests.rs"]
mod tests;

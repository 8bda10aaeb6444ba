// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic persistent, bounded, debounced-save cache (spec §4.6).
//!
//! Every cache file on disk shares the shape
//! `{version, saved_at_ms, <entries>: {id -> entry}}`. Saves are debounced
//! ~1s and use write-to-tmp+rename so a crash mid-write never corrupts the
//! previous good file. Reads are lenient: an entry that fails to deserialize
//! is dropped, and a file that fails to parse at all is quarantined
//! (renamed `.corrupt-<epoch>`), retaining only the `K` most recent
//! quarantined files.

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

const CACHE_SCHEMA_VERSION: u32 = 1;
const DEBOUNCE: Duration = Duration::from_secs(1);
const MAX_QUARANTINED_FILES: usize = 5;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct CacheFile<V> {
    version: u32,
    saved_at_ms: i64,
    entries: IndexMap<String, V>,
}

struct Inner<V> {
    /// Insertion-ordered so eviction can drop the oldest entry (`shift_remove`
    /// on the front) in O(1) amortized, matching the "evict oldest by
    /// timestamp" invariant for a cache whose keys are inserted roughly in
    /// timestamp order.
    entries: IndexMap<String, V>,
    dirty: bool,
}

/// A persistent cache mapping string keys to values of type `V`, bounded at
/// `max_size` entries (oldest-by-insertion evicted on overflow — callers that
/// need timestamp-based eviction wrap entries in a type carrying their own
/// timestamp and compare on that field before calling `evict_if_over`).
pub struct PersistentCache<V> {
    path: PathBuf,
    max_size: Option<usize>,
    inner: Arc<Mutex<Inner<V>>>,
    save_scheduled: Arc<AtomicBool>,
}

impl<V> Clone for PersistentCache<V> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            max_size: self.max_size,
            inner: self.inner.clone(),
            save_scheduled: self.save_scheduled.clone(),
        }
    }
}

impl<V> PersistentCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Load (leniently) or create an empty cache rooted at `path`.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load_entries(&path);
        Self {
            path,
            max_size: None,
            inner: Arc::new(Mutex::new(Inner {
                entries,
                dirty: false,
            })),
            save_scheduled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    fn load_entries(path: &Path) -> IndexMap<String, V> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return IndexMap::new(),
        };
        match serde_json::from_str::<CacheFile<V>>(&raw) {
            Ok(file) => file.entries,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "quarantining corrupt cache file");
                quarantine(path);
                IndexMap::new()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().entries.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or overwrite an entry, evicting the oldest-inserted entry if
    /// this would exceed `max_size`, then schedule a debounced save.
    pub fn insert(&self, key: String, value: V) {
        {
            let mut inner = self.inner.lock();
            if let Some(max) = self.max_size {
                if inner.entries.len() >= max && !inner.entries.contains_key(&key) {
                    inner.entries.shift_remove_index(0);
                }
            }
            inner.entries.insert(key, value);
            inner.dirty = true;
        }
        self.schedule_save();
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        let removed = {
            let mut inner = self.inner.lock();
            let removed = inner.entries.remove(key);
            if removed.is_some() {
                inner.dirty = true;
            }
            removed
        };
        if removed.is_some() {
            self.schedule_save();
        }
        removed
    }

    pub fn retain(&self, mut f: impl FnMut(&str, &V) -> bool) {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|k, v| f(k, v));
        if inner.entries.len() != before {
            inner.dirty = true;
            drop(inner);
            self.schedule_save();
        }
    }

    pub fn iter(&self) -> Vec<(String, V)> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Write the current in-memory state to disk immediately, bypassing the
    /// debounce. Used by tests and graceful shutdown.
    pub fn save_now(&self) -> Result<(), CacheError> {
        let entries = self.inner.lock().entries.clone();
        write_atomic(
            &self.path,
            &CacheFile {
                version: CACHE_SCHEMA_VERSION,
                saved_at_ms: now_ms(),
                entries,
            },
        )?;
        self.inner.lock().dirty = false;
        Ok(())
    }

    /// Schedule a debounced save ~1s from now if one isn't already pending.
    /// Cheap to call on every mutation; only the first call in a burst
    /// actually spawns a task.
    fn schedule_save(&self) {
        if self
            .save_scheduled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE).await;
            this.save_scheduled.store(false, Ordering::SeqCst);
            if let Err(err) = this.save_now() {
                warn!(path = %this.path.display(), error = %err, "debounced cache save failed");
            }
        });
    }
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn write_atomic<V: Serialize>(path: &Path, file: &CacheFile<V>) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| CacheError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_vec_pretty(file)?;
    fs::write(&tmp_path, json).map_err(|source| CacheError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn quarantine(path: &Path) {
    let quarantined = path.with_extension(format!("corrupt-{}", now_ms()));
    if fs::rename(path, &quarantined).is_err() {
        return;
    }
    prune_quarantined(path);
}

/// Keep only the `MAX_QUARANTINED_FILES` most recent `.corrupt-<epoch>`
/// siblings of `path`, deleting older ones.
fn prune_quarantined(path: &Path) {
    let Some(parent) = path.parent() else { return };
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return;
    };
    let Ok(entries) = fs::read_dir(parent) else {
        return;
    };
    let prefix = format!("{stem}.corrupt-");
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix))
        })
        .collect();
    candidates.sort();
    while candidates.len() > MAX_QUARANTINED_FILES {
        let oldest = candidates.remove(0);
        let _ = fs::remove_file(oldest);
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Dispatcher (spec §4.5): fingerprint dedup, priority classification,
//! verbosity filtering, and fan-out to the listener registry.

use crate::listener_registry::ListenerRegistry;
use bosun_core::{Clock, Event};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicI64, Ordering};

const DEDUP_WINDOW_MS: i64 = 15_000;
const MAX_DEDUP_ENTRIES: usize = 2_000;

/// Verbosity threshold: `minimal` keeps priority 1-2, `summary` keeps 1-4,
/// `detailed` keeps everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Minimal,
    Summary,
    Detailed,
}

impl Verbosity {
    pub(crate) fn max_priority(self) -> u8 {
        match self {
            Verbosity::Minimal => 2,
            Verbosity::Summary => 4,
            Verbosity::Detailed => 5,
        }
    }
}

/// Options passed alongside a dispatch call.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    pub dedup_key: Option<String>,
    pub priority: Option<u8>,
    pub skip_dedup: bool,
}

struct NegativePattern {
    tokens: &'static [&'static str],
    priority: u8,
}

static NEGATIVE_PATTERNS: &[NegativePattern] = &[
    NegativePattern {
        tokens: &["critical", "fatal"],
        priority: 1,
    },
    NegativePattern {
        tokens: &["error", "failed"],
        priority: 2,
    },
    NegativePattern {
        tokens: &["warning", "warn"],
        priority: 3,
    },
    NegativePattern {
        tokens: &["info", "informational"],
        priority: 4,
    },
    NegativePattern {
        tokens: &["trace"],
        priority: 5,
    },
];

static POSITIVE_TOKENS: &[&str] = &["completed", "merged", "status update", "status-update"];

static NUMERIC_ID: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\b\d+\b").expect("valid regex"));
static ISO_TIMESTAMP: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\d{4}-\d{2}-\d{2}T[\d:.]+Z?").expect("valid regex")
});
static PATH_TAIL: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"/[^/\s]+$").expect("valid regex"));

/// Classify message text into a 1-5 priority per spec §4.5. Positive-signal
/// tokens suppress negative-keyword classification entirely, falling back
/// to informational (4).
pub fn classify_priority(message: &str) -> u8 {
    let lower = message.to_lowercase();
    if POSITIVE_TOKENS.iter().any(|t| lower.contains(t)) {
        return 4;
    }
    for pattern in NEGATIVE_PATTERNS {
        if pattern.tokens.iter().any(|t| lower.contains(t)) {
            return pattern.priority;
        }
    }
    4
}

/// Strip volatile substrings (numeric ids, ISO timestamps, trailing path
/// tails) from a dedup key so that near-identical events collapse to the
/// same fingerprint.
pub fn normalize_dedup_key(key: &str) -> String {
    let stripped = ISO_TIMESTAMP.replace_all(key, "<ts>");
    let stripped = NUMERIC_ID.replace_all(&stripped, "<n>");
    PATH_TAIL.replace_all(&stripped, "").trim().to_string()
}

struct DedupEntry {
    last_dispatch_at_ms: i64,
}

/// Central fan-out point for every observable event in the system.
pub struct EventDispatcher<C: Clock> {
    clock: C,
    dedup: Mutex<IndexMap<String, DedupEntry>>,
    verbosity: Verbosity,
    listeners: ListenerRegistry,
    dispatch_count: AtomicI64,
}

impl<C: Clock> EventDispatcher<C> {
    pub fn new(clock: C, verbosity: Verbosity, listeners: ListenerRegistry) -> Self {
        Self {
            clock,
            dedup: Mutex::new(IndexMap::new()),
            verbosity,
            listeners,
            dispatch_count: AtomicI64::new(0),
        }
    }

    /// `true` if `key` was already dispatched within `window_ms`.
    pub fn is_deduped_soon(&self, key: &str, window_ms: i64) -> bool {
        let now = self.clock.now_ms();
        let dedup = self.dedup.lock();
        dedup
            .get(key)
            .is_some_and(|entry| now - entry.last_dispatch_at_ms < window_ms)
    }

    /// Dispatch `event`. Returns `true` if it was actually fanned out (i.e.
    /// not suppressed by dedup or verbosity filtering).
    pub fn dispatch(&self, event: Event, opts: DispatchOptions) -> bool {
        let now = self.clock.now_ms();
        let message = event.default_message();
        let priority = opts.priority.unwrap_or_else(|| classify_priority(&message));

        if priority > self.verbosity.max_priority() {
            return false;
        }

        if !opts.skip_dedup {
            let raw_key = opts.dedup_key.unwrap_or_else(|| message.clone());
            let key = normalize_dedup_key(&raw_key);
            let mut dedup = self.dedup.lock();
            if let Some(entry) = dedup.get(&key) {
                if now - entry.last_dispatch_at_ms < DEDUP_WINDOW_MS {
                    return false;
                }
            }
            if dedup.len() >= MAX_DEDUP_ENTRIES && !dedup.contains_key(&key) {
                dedup.shift_remove_index(0);
            }
            dedup.insert(key, DedupEntry { last_dispatch_at_ms: now });
        }

        self.dispatch_count.fetch_add(1, Ordering::Relaxed);
        self.listeners.fan_out(&event, priority);
        true
    }

    pub fn dispatch_count(&self) -> i64 {
        self.dispatch_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

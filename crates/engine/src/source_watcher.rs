// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source-Change Watcher (spec §4.7): watches the directory containing the
//! core's own source files and, after a quiet period with no further
//! changes, decides whether to defer a self-restart (active agents still
//! running), extend the defer window (only young agents left), or force the
//! restart through.
//!
//! The decision state machine is clock-driven and unit-tested with
//! `FakeClock`; the real filesystem watch is a thin `notify`-crate wrapper
//! that feeds `note_change` from a background thread.

use bosun_core::Clock;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct SourceWatcherConfig {
    pub quiet_ms: i64,
    pub retry_ms: i64,
    pub defer_hard_cap: u32,
    pub max_defer_ms: i64,
    pub force_active_slot_min_age_ms: i64,
}

impl Default for SourceWatcherConfig {
    fn default() -> Self {
        Self {
            quiet_ms: 90_000,
            retry_ms: 30_000,
            defer_hard_cap: 6,
            max_defer_ms: 3 * 60 * 1000,
            force_active_slot_min_age_ms: 3 * 60 * 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferOutcome {
    /// Quiet period hasn't elapsed yet; nothing to evaluate.
    NotYetQuiet,
    /// Active agents are running; the restart was deferred another round.
    Deferred,
    /// The restart goes ahead. `force_active_agent_exit` is set when the
    /// defer cap/max-defer-time was reached and agents were terminated
    /// anyway rather than extending the window further.
    ForceRestart { force_active_agent_exit: bool },
}

#[derive(Debug, Default)]
struct WatcherState {
    pending: bool,
    last_change_at_ms: i64,
    defer_count: u32,
    first_defer_at_ms: Option<i64>,
}

/// Tracks pending source changes and the defer/force-restart decision tree.
pub struct SourceWatcher<C: Clock> {
    clock: C,
    config: SourceWatcherConfig,
    state: Mutex<WatcherState>,
}

impl<C: Clock> SourceWatcher<C> {
    pub fn new(clock: C, config: SourceWatcherConfig) -> Self {
        Self {
            clock,
            config,
            state: Mutex::new(WatcherState::default()),
        }
    }

    /// Record that a source file changed, (re)starting the quiet-period
    /// countdown.
    pub fn note_change(&self) {
        let mut s = self.state.lock();
        s.pending = true;
        s.last_change_at_ms = self.clock.now_ms();
    }

    pub fn has_pending_change(&self) -> bool {
        self.state.lock().pending
    }

    fn quiet_elapsed(&self, state: &WatcherState) -> bool {
        state.pending && self.clock.now_ms() - state.last_change_at_ms >= self.config.quiet_ms
    }

    /// Evaluate the pending change against the current set of in-process
    /// active-agent ages. Call on a retry timer (`retry_ms` apart) once a
    /// change has been observed.
    pub fn evaluate(&self, active_agent_ages_ms: &[i64]) -> DeferOutcome {
        let mut s = self.state.lock();
        if !self.quiet_elapsed(&s) {
            return DeferOutcome::NotYetQuiet;
        }
        if active_agent_ages_ms.is_empty() {
            s.pending = false;
            s.defer_count = 0;
            s.first_defer_at_ms = None;
            return DeferOutcome::ForceRestart {
                force_active_agent_exit: false,
            };
        }

        let now = self.clock.now_ms();
        s.defer_count += 1;
        let first_defer_at = *s.first_defer_at_ms.get_or_insert(now);
        let cap_hit =
            s.defer_count >= self.config.defer_hard_cap || now - first_defer_at >= self.config.max_defer_ms;

        if !cap_hit {
            return DeferOutcome::Deferred;
        }

        let any_young = active_agent_ages_ms
            .iter()
            .any(|&age| age < self.config.force_active_slot_min_age_ms);
        if any_young {
            // Extend the window rather than force-killing a just-started agent.
            s.defer_count = 0;
            s.first_defer_at_ms = Some(now);
            DeferOutcome::Deferred
        } else {
            s.pending = false;
            s.defer_count = 0;
            s.first_defer_at_ms = None;
            DeferOutcome::ForceRestart {
                force_active_agent_exit: true,
            }
        }
    }
}

/// Spawns a background thread watching `root` for filesystem changes and
/// calling `on_change` for each event outside `node_modules`. Runs on a
/// dedicated OS thread because `notify`'s watcher callback is synchronous.
pub fn watch_source_dir(
    root: &Path,
    on_change: impl Fn() + Send + 'static,
) -> notify::Result<notify::RecommendedWatcher> {
    use notify::{RecursiveMode, Watcher};

    let (tx, rx) = channel::<notify::Result<notify::Event>>();
    let mut watcher = notify::recommended_watcher(tx)?;
    watcher.watch(root, RecursiveMode::Recursive)?;

    std::thread::spawn(move || {
        for res in rx {
            match res {
                Ok(event) => {
                    let is_noise = event
                        .paths
                        .iter()
                        .any(|p| p.components().any(|c| c.as_os_str() == "node_modules"));
                    if !is_noise {
                        info!(?event.kind, "source change observed");
                        on_change();
                    }
                }
                Err(e) => warn!(error = %e, "source watch error"),
            }
        }
    });

    Ok(watcher)
}

pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(30);

#[cfg(test)]
#[path = "source_watcher_tests.rs"]
mod tests;

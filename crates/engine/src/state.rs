// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `CoreState` (spec §9 "globals for cache state"): the single owned
//! aggregate of every mutex-guarded cache and piece of shared state the
//! supervisor and its components read and write. Constructed once in
//! `bosun-daemon::main` and shared by `Arc`; every sub-store sits behind
//! its own lock rather than one coarse lock over the whole struct.

use crate::circuit_breaker::CircuitBreaker;
use crate::dispatcher::EventDispatcher;
use crate::listener_registry::ListenerRegistry;
use crate::loop_detector::LoopDetector;
use crate::reconciler::ReconcilerCaches;
use crate::restart_controller::RestartController;
use bosun_adapters::ChildHandle;
use bosun_core::Clock;
use bosun_storage::{EpicMergeCache, NoAttemptLogCache};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Named sub-stores behind their own mutex, plus the atomics every
/// timer/listener checks before acting. One instance per process.
pub struct CoreState<C: Clock> {
    clock: C,
    shutting_down: AtomicBool,
    restart_requested: AtomicBool,
    current_child: Mutex<Option<Box<dyn ChildHandle>>>,
    pub restart_controller: Arc<RestartController<C>>,
    pub circuit_breaker: Arc<CircuitBreaker<C>>,
    pub loop_detector: Arc<LoopDetector<C>>,
    pub dispatcher: Arc<EventDispatcher<C>>,
    pub reconciler_caches: ReconcilerCaches,
    pub no_attempt_log: NoAttemptLogCache,
    pub epic_merge: EpicMergeCache,
}

impl<C: Clock> CoreState<C> {
    /// Builds every cache from files under `cache_dir`, matching the
    /// `<repoRoot>/.bosun/.cache/*.json` layout (spec §6).
    pub fn new(clock: C, cache_dir: impl AsRef<Path>, verbosity: crate::dispatcher::Verbosity) -> Self {
        let dir = cache_dir.as_ref();
        let reconciler_caches = ReconcilerCaches {
            recovery: bosun_storage::RecoveryCache::load(dir.join("task-recovery-cache.json")),
            merged_branch: bosun_storage::MergedBranchCache::load(dir.join("merged-branch-cache.json")),
            merged_task_id: bosun_storage::MergedTaskIdCache::load(dir.join("merged-task-id-cache.json")),
            conflict_cooldown: bosun_storage::ConflictCooldownCache::load(
                dir.join("conflict-cooldown-cache.json"),
            ),
        };
        Self {
            dispatcher: Arc::new(EventDispatcher::new(
                clock.clone(),
                verbosity,
                ListenerRegistry::new(),
            )),
            restart_controller: Arc::new(RestartController::new(clock.clone())),
            circuit_breaker: Arc::new(CircuitBreaker::new(clock.clone())),
            loop_detector: Arc::new(LoopDetector::new(clock.clone())),
            reconciler_caches,
            no_attempt_log: NoAttemptLogCache::load(dir.join("no-attempt-log-cache.json")),
            epic_merge: EpicMergeCache::load(dir.join("epic-merge-cache.json")),
            shutting_down: AtomicBool::new(false),
            restart_requested: AtomicBool::new(false),
            current_child: Mutex::new(None),
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    pub fn begin_shutdown(&self) -> bool {
        // `swap` so a second SIGINT observes `true` and can be treated as
        // "force" by the caller (spec §4.1 "ignore a second SIGINT as force").
        !self.shutting_down.swap(true, Ordering::SeqCst)
    }

    pub fn take_restart_requested(&self) -> bool {
        self.restart_requested.swap(false, Ordering::SeqCst)
    }

    pub fn request_restart(&self) {
        self.restart_requested.store(true, Ordering::SeqCst);
    }

    pub fn set_current_child(&self, child: Option<Box<dyn ChildHandle>>) {
        *self.current_child.lock() = child;
    }

    pub fn current_child_pid(&self) -> Option<u32> {
        self.current_child.lock().as_ref().and_then(|c| c.pid())
    }

    pub fn with_current_child<R>(&self, f: impl FnOnce(Option<&mut Box<dyn ChildHandle>>) -> R) -> R {
        let mut guard = self.current_child.lock();
        f(guard.as_mut())
    }
}

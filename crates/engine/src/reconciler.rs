// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciler (spec §4.4): the periodic cross-source task status sweep.
//! Joins the task store, the supervisor's live attempt snapshot, the
//! external task-board's attempt list, and PR-host state into a per-task
//! decision — recover to `todo`, advance to `inreview`/`done`, defer to the
//! conflict-resolution cooldown path, or leave alone.

use crate::dispatcher::{DispatchOptions, EventDispatcher};
use crate::error::EngineError;
use bosun_adapters::{MergeState, PrHost, TaskBoard, TaskStore, TransitionSource};
use bosun_core::{Attempt, AttemptId, Clock, Event, Task, TaskId, TaskStatus};
use bosun_storage::{ConflictCooldownCache, MergedBranchCache, MergedTaskIdCache, RecoveryCache, RecoveryState, ResolvedStatus};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_STALE_TASK_AGE_MS: i64 = 3 * 60 * 60 * 1000;
const DEFAULT_STALE_MAX_STRIKES: u32 = 2;
const DEFAULT_PR_HOST_THROTTLE_MS: i64 = 1_500;
const DEFAULT_CONFLICT_COOLDOWN_MS: i64 = 30 * 60 * 1000;
const DEFAULT_CONFLICT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_FETCH_FAILURE_SKIP_MS: i64 = 5 * 60 * 1000;
const DEFAULT_BASE_BRANCH: &str = "main";

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub stale_task_age_ms: i64,
    pub stale_max_strikes: u32,
    pub pr_host_throttle_ms: i64,
    pub conflict_cooldown_ms: i64,
    pub conflict_max_attempts: u32,
    pub fetch_failure_skip_ms: i64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            stale_task_age_ms: DEFAULT_STALE_TASK_AGE_MS,
            stale_max_strikes: DEFAULT_STALE_MAX_STRIKES,
            pr_host_throttle_ms: DEFAULT_PR_HOST_THROTTLE_MS,
            conflict_cooldown_ms: DEFAULT_CONFLICT_COOLDOWN_MS,
            conflict_max_attempts: DEFAULT_CONFLICT_MAX_ATTEMPTS,
            fetch_failure_skip_ms: DEFAULT_FETCH_FAILURE_SKIP_MS,
        }
    }
}

/// The subset of §4.6's cache table this module reads and writes.
pub struct ReconcilerCaches {
    pub recovery: RecoveryCache,
    pub merged_branch: MergedBranchCache,
    pub merged_task_id: MergedTaskIdCache,
    pub conflict_cooldown: ConflictCooldownCache,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateSource {
    Local,
    TaskBoard,
    TaskFields,
}

#[derive(Debug, Clone)]
struct Candidate {
    branch: Option<String>,
    pr_number: Option<u64>,
    attempt_id: Option<AttemptId>,
    base_branch: Option<String>,
    #[allow(dead_code)]
    source: CandidateSource,
}

/// A single candidate's PR-host state, resolved during the preflight pass
/// before any candidate is acted on (spec §4.4 "Ties").
#[derive(Debug, Clone)]
enum CandidateResolution {
    Merged { pr_number: u64, branch: String },
    OpenClean { pr_number: u64 },
    OpenConflicted(Candidate),
    Unresolved,
}

/// The result of reconciling a single task, surfaced for observability and
/// tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    SkippedDone,
    SkippedRecoverySkip,
    RecoveredToTodo,
    StruckIdle(u32),
    MarkedDone { pr_number: u64 },
    MovedInReview { pr_number: u64 },
    ConflictDeferred,
    ConflictGivenUp,
    NoChange,
}

pub struct Reconciler<C: Clock, TS: TaskStore, PH: PrHost, TB: TaskBoard> {
    clock: C,
    task_store: Arc<TS>,
    pr_host: Arc<PH>,
    task_board: Arc<TB>,
    caches: ReconcilerCaches,
    dispatcher: Arc<EventDispatcher<C>>,
    config: ReconcilerConfig,
    running: AtomicBool,
}

impl<C: Clock, TS: TaskStore, PH: PrHost, TB: TaskBoard> Reconciler<C, TS, PH, TB> {
    pub fn new(
        clock: C,
        task_store: Arc<TS>,
        pr_host: Arc<PH>,
        task_board: Arc<TB>,
        caches: ReconcilerCaches,
        dispatcher: Arc<EventDispatcher<C>>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            clock,
            task_store,
            pr_host,
            task_board,
            caches,
            dispatcher,
            config,
            running: AtomicBool::new(false),
        }
    }

    /// Run one full sweep: `inprogress` and `inreview` tasks, joined
    /// against `local_attempts` (the supervisor's in-process status
    /// snapshot). Rejects re-entry per spec §5 "Reconciler sweeps are never
    /// concurrent with themselves".
    pub async fn sweep(
        &self,
        local_attempts: &[Attempt],
    ) -> Result<Vec<(TaskId, TaskOutcome)>, EngineError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(EngineError::ReconcileReentrant);
        }
        let outcomes = self.sweep_inner(local_attempts).await;
        self.running.store(false, Ordering::Release);
        Ok(outcomes)
    }

    async fn sweep_inner(&self, local_attempts: &[Attempt]) -> Vec<(TaskId, TaskOutcome)> {
        let mut outcomes = Vec::new();
        for status in [TaskStatus::InProgress, TaskStatus::InReview] {
            let tasks = match self.task_store.get_tasks_by_status(status).await {
                Ok(tasks) => tasks,
                Err(error) => {
                    tracing::warn!(%error, ?status, "failed to list tasks for reconcile sweep");
                    continue;
                }
            };
            for task in tasks {
                let outcome = self.reconcile_task(&task, local_attempts).await;
                outcomes.push((task.id.clone(), outcome));
            }
        }
        outcomes
    }

    /// The per-task algorithm of spec §4.4.
    pub async fn reconcile_task(&self, task: &Task, local_attempts: &[Attempt]) -> TaskOutcome {
        let now = self.clock.now_ms();

        if self.caches.merged_task_id.contains(task.id.as_str()) {
            return TaskOutcome::SkippedDone;
        }

        if let Some(state) = self.caches.recovery.get(task.id.as_str(), task.updated_at_ms, now) {
            if Self::skip_still_valid(&state, now, self.config.fetch_failure_skip_ms) {
                return TaskOutcome::SkippedRecoverySkip;
            }
        }

        let candidates = self.gather_candidates(task, local_attempts).await;
        if candidates.is_empty() {
            return self.handle_idle(task).await;
        }

        // Preflight pass (spec §4.4 "Ties"): resolve every candidate's PR
        // state before acting on any of them. A candidate with an open PR
        // must be able to override another candidate's merge finding, which
        // is impossible if the loop below returns on the first merge it
        // sees.
        let mut resolutions = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            resolutions.push(self.resolve_candidate(task, candidate, &candidates).await);
        }

        let conflict_candidates: Vec<Candidate> = resolutions
            .iter()
            .filter_map(|r| match r {
                CandidateResolution::OpenConflicted(c) => Some(c.clone()),
                _ => None,
            })
            .collect();

        if !conflict_candidates.is_empty() {
            let mut gave_up = false;
            for candidate in &conflict_candidates {
                if self.handle_conflict_candidate(task, candidate).await == TaskOutcome::ConflictGivenUp {
                    gave_up = true;
                }
            }
            return if gave_up {
                TaskOutcome::ConflictGivenUp
            } else {
                TaskOutcome::ConflictDeferred
            };
        }

        // An open (non-conflicted) PR wins a tie against a merged candidate
        // found elsewhere in the same sweep: treat the task as not merged.
        if let Some(pr_number) = resolutions.iter().find_map(|r| match r {
            CandidateResolution::OpenClean { pr_number } => Some(*pr_number),
            _ => None,
        }) {
            if task.status != TaskStatus::InReview {
                return self.move_to_inreview(task, pr_number).await;
            }
            return TaskOutcome::NoChange;
        }

        if let Some((pr_number, branch)) = resolutions.into_iter().find_map(|r| match r {
            CandidateResolution::Merged { pr_number, branch } => Some((pr_number, branch)),
            _ => None,
        }) {
            return self.mark_done_via_merge(task, pr_number, &branch).await;
        }

        self.handle_idle(task).await
    }

    /// Resolves a single candidate's PR-host state without acting on it,
    /// so the preflight pass in `reconcile_task` can see every candidate's
    /// outcome before any candidate is committed to.
    async fn resolve_candidate(
        &self,
        task: &Task,
        candidate: &Candidate,
        candidates: &[Candidate],
    ) -> CandidateResolution {
        if let Some(branch) = candidate.branch.as_deref() {
            let normalized = normalize_branch(branch);
            if self.caches.merged_branch.contains(&normalized) {
                let base = self.base_branch_for(task, candidate);
                let result = self.pr_host.is_branch_merged_into_base(branch, base).await;
                self.throttle().await;
                if result.data == Some(true) {
                    return CandidateResolution::Merged {
                        pr_number: candidate.pr_number.unwrap_or_default(),
                        branch: branch.to_string(),
                    };
                }
                let _ = self.caches.merged_branch.evict_and_persist(&normalized);
                return CandidateResolution::Unresolved;
            }
        }

        if let Some(pr_number) = candidate.pr_number {
            let result = self.pr_host.get_by_number(pr_number).await;
            self.throttle().await;
            if let Some(pr) = result.data {
                match pr.state {
                    MergeState::Merged => {
                        return CandidateResolution::Merged { pr_number, branch: pr.branch };
                    }
                    MergeState::OpenConflicted => {
                        let mut enriched = candidate.clone();
                        if enriched.attempt_id.is_none() {
                            enriched.attempt_id = candidates
                                .iter()
                                .find(|c| c.branch == enriched.branch && c.attempt_id.is_some())
                                .and_then(|c| c.attempt_id.clone());
                        }
                        return CandidateResolution::OpenConflicted(enriched);
                    }
                    MergeState::OpenClean => {
                        return CandidateResolution::OpenClean { pr_number };
                    }
                    MergeState::Closed => {}
                }
            }
        }

        if let Some(branch) = candidate.branch.as_deref() {
            let base = self.base_branch_for(task, candidate);
            let result = self.pr_host.is_branch_merged_into_base(branch, base).await;
            self.throttle().await;
            if result.data == Some(true) {
                return CandidateResolution::Merged {
                    pr_number: candidate.pr_number.unwrap_or_default(),
                    branch: branch.to_string(),
                };
            }
        }

        CandidateResolution::Unresolved
    }

    async fn gather_candidates(&self, task: &Task, local_attempts: &[Attempt]) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for attempt in local_attempts.iter().filter(|a| a.task_id == task.id) {
            candidates.push(Candidate {
                branch: Some(attempt.branch.clone()),
                pr_number: None,
                attempt_id: Some(attempt.id.clone()),
                base_branch: task.base_branch.clone(),
                source: CandidateSource::Local,
            });
        }

        let board_attempts = self.task_board.list_attempts(&task.id).await;
        for attempt in board_attempts.data.unwrap_or_default() {
            candidates.push(Candidate {
                branch: Some(attempt.branch.clone()),
                pr_number: None,
                attempt_id: Some(attempt.id.clone()),
                base_branch: task.base_branch.clone(),
                source: CandidateSource::TaskBoard,
            });
        }

        if task.branch.is_some() || task.pr_number.is_some() {
            candidates.push(Candidate {
                branch: task.branch.clone(),
                pr_number: task.pr_number,
                attempt_id: None,
                base_branch: task.base_branch.clone(),
                source: CandidateSource::TaskFields,
            });
        }

        let mut seen = HashSet::new();
        candidates.retain(|c| seen.insert((c.branch.clone(), c.pr_number)));
        candidates
    }

    fn base_branch_for<'a>(&self, task: &'a Task, candidate: &'a Candidate) -> &'a str {
        candidate
            .base_branch
            .as_deref()
            .or(task.base_branch.as_deref())
            .unwrap_or(DEFAULT_BASE_BRANCH)
    }

    async fn throttle(&self) {
        if self.config.pr_host_throttle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.pr_host_throttle_ms as u64)).await;
        }
    }

    async fn mark_done_via_merge(&self, task: &Task, pr_number: u64, branch: &str) -> TaskOutcome {
        let now = self.clock.now_ms();
        if let Err(error) = self
            .task_store
            .set_task_status(&task.id, TaskStatus::Done, TransitionSource::Reconciler)
            .await
        {
            tracing::warn!(task_id = %task.id, %error, "failed to mark task done after merge");
            return TaskOutcome::NoChange;
        }
        self.caches.merged_branch.mark_merged(normalize_branch(branch), now);
        self.caches.merged_task_id.mark_merged(task.id.as_str(), now);
        self.caches.recovery.clear(task.id.as_str());
        self.dispatcher.dispatch(
            Event::PrMerged {
                task_id: task.id.clone(),
                pr_number,
                branch: branch.to_string(),
            },
            DispatchOptions::default(),
        );
        self.dispatcher.dispatch(
            Event::DownstreamRebaseNeeded {
                branch: branch.to_string(),
            },
            DispatchOptions::default(),
        );
        TaskOutcome::MarkedDone { pr_number }
    }

    async fn move_to_inreview(&self, task: &Task, pr_number: u64) -> TaskOutcome {
        if let Err(error) = self
            .task_store
            .set_task_status(&task.id, TaskStatus::InReview, TransitionSource::Reconciler)
            .await
        {
            tracing::warn!(task_id = %task.id, %error, "failed to move task to inreview");
            return TaskOutcome::NoChange;
        }
        self.dispatcher.dispatch(
            Event::PrOpened {
                task_id: task.id.clone(),
                pr_number,
                branch: task.branch.clone().unwrap_or_default(),
            },
            DispatchOptions::default(),
        );
        TaskOutcome::MovedInReview { pr_number }
    }

    async fn handle_idle(&self, task: &Task) -> TaskOutcome {
        let now = self.clock.now_ms();
        let age = task.age_ms(now);
        if age < self.config.stale_task_age_ms {
            let strikes = self.caches.recovery.record_strike(task.id.as_str(), task.updated_at_ms, now);
            if strikes >= self.config.stale_max_strikes {
                self.safe_recover_task(task).await
            } else {
                TaskOutcome::StruckIdle(strikes)
            }
        } else {
            self.safe_recover_task(task).await
        }
    }

    /// Guarded transition to `todo` (spec §4.4 "safeRecoverTask"): re-fetch
    /// live status before acting, since a sweep's view may be stale.
    async fn safe_recover_task(&self, task: &Task) -> TaskOutcome {
        let now = self.clock.now_ms();
        match self.task_store.get_task(&task.id).await {
            Ok(Some(live)) if live.status.is_terminal() => {
                self.caches.recovery.record_skip(
                    task.id.as_str(),
                    resolved_status_for(live.status),
                    live.updated_at_ms,
                    now,
                );
                TaskOutcome::SkippedRecoverySkip
            }
            Ok(Some(live)) if live.status == TaskStatus::Todo => {
                self.caches
                    .recovery
                    .record_skip(task.id.as_str(), ResolvedStatus::Todo, live.updated_at_ms, now);
                TaskOutcome::SkippedRecoverySkip
            }
            Ok(Some(live)) => {
                if let Err(error) = self
                    .task_store
                    .set_task_status(&live.id, TaskStatus::Todo, TransitionSource::Reconciler)
                    .await
                {
                    tracing::warn!(task_id = %live.id, %error, "failed to recover task to todo");
                    return TaskOutcome::NoChange;
                }
                self.caches.recovery.clear(live.id.as_str());
                self.dispatcher.dispatch(
                    Event::TaskRecovered {
                        task_id: live.id.clone(),
                    },
                    DispatchOptions::default(),
                );
                TaskOutcome::RecoveredToTodo
            }
            Ok(None) | Err(_) => {
                self.caches.recovery.record_skip(
                    task.id.as_str(),
                    ResolvedStatus::FetchFailed,
                    task.updated_at_ms,
                    now,
                );
                TaskOutcome::SkippedRecoverySkip
            }
        }
    }

    async fn handle_conflict_candidate(&self, task: &Task, candidate: &Candidate) -> TaskOutcome {
        let now = self.clock.now_ms();
        if self
            .caches
            .conflict_cooldown
            .in_cooldown(task.id.as_str(), task.updated_at_ms, now)
        {
            return TaskOutcome::ConflictDeferred;
        }
        let Some(attempt_id) = &candidate.attempt_id else {
            return TaskOutcome::ConflictDeferred;
        };

        let result = self.task_board.resolve_conflict(attempt_id.as_str()).await;
        if result.ok {
            self.caches.conflict_cooldown.resolved(task.id.as_str());
            return TaskOutcome::NoChange;
        }

        let attempts = self.caches.conflict_cooldown.record_conflict(
            task.id.as_str(),
            task.updated_at_ms,
            self.config.conflict_cooldown_ms,
            now,
        );
        if attempts >= self.config.conflict_max_attempts {
            tracing::warn!(task_id = %task.id, attempts, "giving up on conflict resolution");
            TaskOutcome::ConflictGivenUp
        } else {
            TaskOutcome::ConflictDeferred
        }
    }

    /// Whether a recovery-cache entry still represents a live skip
    /// decision. `FetchFailed` entries expire after a shorter window than
    /// the cache's own 30-minute TTL (spec §4.4 "On fetch failure, cache a
    /// short-TTL (5 min) skip entry").
    fn skip_still_valid(state: &RecoveryState, now_ms: i64, fetch_failure_skip_ms: i64) -> bool {
        match state.resolved_status {
            Some(ResolvedStatus::FetchFailed) => now_ms - state.last_check_at_ms < fetch_failure_skip_ms,
            Some(_) => true,
            None => false,
        }
    }
}

fn resolved_status_for(status: TaskStatus) -> ResolvedStatus {
    match status {
        TaskStatus::Done => ResolvedStatus::Done,
        TaskStatus::Cancelled => ResolvedStatus::Cancelled,
        _ => ResolvedStatus::Todo,
    }
}

fn normalize_branch(branch: &str) -> String {
    branch.trim().trim_start_matches("refs/heads/").to_lowercase()
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;

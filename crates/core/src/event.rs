// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types flowing through the dispatcher (spec §4.5) and produced by the
//! reconciler, child I/O pipeline, supervisor, and watchers.

use crate::id::{AttemptId, TaskId};
use serde::{Deserialize, Serialize};

/// One observable event in the system. Serializes as a tagged enum so stored
/// anomaly signals and dedup-window snapshots round-trip cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A task was recovered to `todo` after exhausting its stale-strike budget.
    TaskRecovered { task_id: TaskId },
    /// A task moved to `inreview` because an open PR was found.
    TaskInReview { task_id: TaskId, pr_number: u64 },
    /// A task was marked `done` via a merged PR.
    TaskDone { task_id: TaskId, pr_number: u64 },
    /// A PR was found merged; carries the branch so the merged-branch cache
    /// can be populated.
    PrMerged {
        task_id: TaskId,
        pr_number: u64,
        branch: String,
    },
    /// An open PR was observed for a task.
    PrOpened {
        task_id: TaskId,
        pr_number: u64,
        branch: String,
    },
    /// Fired after a merge to prompt dependent branches to rebase.
    DownstreamRebaseNeeded { branch: String },
    /// A genuine error line was classified out of child stdout/stderr.
    ErrorDetected {
        fingerprint: String,
        message: String,
    },
    /// Loop detector crossed its repeat threshold for a fingerprint.
    ErrorLoopDetected { fingerprint: String, count: u32 },
    /// `"Merged PR #<n>"` marker line.
    MergedPrMarker { pr_number: u64 },
    /// `"Merge notify: PR #<n> stage=…"` marker line.
    MergeNotifyMarker { pr_number: u64, stage: String },
    /// `"Tracking new attempt: <shortId> → <branch>"` marker line.
    AttemptTracked {
        short_id: String,
        branch: String,
    },
    /// `"Attempt <shortId> finished (completed|failed)"` marker line.
    AttemptFinished {
        short_id: String,
        completed: bool,
    },
    /// `"No remote branch for <branch>"` marker line.
    NoRemoteBranch { branch: String },
    /// `"ALL TASKS COMPLETE"` marker line.
    BacklogEmpty,
    /// `"Another orchestrator instance is already running"` marker line.
    AnotherInstanceRunning,
    /// The child's log indicated context-window exhaustion; a fresh session
    /// should be requested for the attempt.
    ContextWindowExhausted { attempt_id: Option<AttemptId> },
    /// A digest buffer was flushed/sealed.
    DigestSealed { entry_count: usize },
    /// A non-fatal anomaly worth recording to the signal file.
    Anomaly {
        kind: String,
        severity: AnomalySeverity,
        message: String,
    },
}

impl Event {
    /// The dot-prefixed routing key used by the `ListenerRegistry`
    /// (`task.`, `pr.`, `agent.`, …) — see spec §9 "dynamic listener fan-out".
    pub fn routing_prefix(&self) -> &'static str {
        match self {
            Event::TaskRecovered { .. }
            | Event::TaskInReview { .. }
            | Event::TaskDone { .. } => "task.",
            Event::PrMerged { .. } | Event::PrOpened { .. } | Event::DownstreamRebaseNeeded { .. } => {
                "pr."
            }
            Event::ErrorDetected { .. } | Event::ErrorLoopDetected { .. } => "error.",
            Event::MergedPrMarker { .. }
            | Event::MergeNotifyMarker { .. }
            | Event::AttemptTracked { .. }
            | Event::AttemptFinished { .. }
            | Event::NoRemoteBranch { .. }
            | Event::BacklogEmpty
            | Event::AnotherInstanceRunning
            | Event::ContextWindowExhausted { .. } => "agent.",
            Event::DigestSealed { .. } => "digest.",
            Event::Anomaly { .. } => "anomaly.",
        }
    }

    /// A human-readable message used for default priority classification and
    /// notification text when the caller doesn't supply one explicitly.
    pub fn default_message(&self) -> String {
        match self {
            Event::TaskRecovered { task_id } => format!("task {} recovered to todo", task_id),
            Event::TaskInReview { task_id, pr_number } => {
                format!("task {} moved to inreview via PR #{}", task_id, pr_number)
            }
            Event::TaskDone { task_id, pr_number } => {
                format!("task {} completed via merged PR #{}", task_id, pr_number)
            }
            Event::PrMerged {
                task_id,
                pr_number,
                branch,
            } => format!("PR #{} ({}) merged for task {}", pr_number, branch, task_id),
            Event::PrOpened {
                task_id,
                pr_number,
                branch,
            } => format!("PR #{} ({}) opened for task {}", pr_number, branch, task_id),
            Event::DownstreamRebaseNeeded { branch } => {
                format!("downstream rebase needed after merge of {}", branch)
            }
            Event::ErrorDetected { message, .. } => message.clone(),
            Event::ErrorLoopDetected { fingerprint, count } => {
                format!("error loop detected: {} ({} occurrences)", fingerprint, count)
            }
            Event::MergedPrMarker { pr_number } => format!("Merged PR #{}", pr_number),
            Event::MergeNotifyMarker { pr_number, stage } => {
                format!("Merge notify: PR #{} stage={}", pr_number, stage)
            }
            Event::AttemptTracked { short_id, branch } => {
                format!("Tracking new attempt: {} → {}", short_id, branch)
            }
            Event::AttemptFinished {
                short_id,
                completed,
            } => format!(
                "Attempt {} finished ({})",
                short_id,
                if *completed { "completed" } else { "failed" }
            ),
            Event::NoRemoteBranch { branch } => format!("No remote branch for {}", branch),
            Event::BacklogEmpty => "ALL TASKS COMPLETE".to_string(),
            Event::AnotherInstanceRunning => {
                "Another orchestrator instance is already running".to_string()
            }
            Event::ContextWindowExhausted { .. } => "context window exhausted".to_string(),
            Event::DigestSealed { entry_count } => format!("digest sealed with {} entries", entry_count),
            Event::Anomaly { message, .. } => message.clone(),
        }
    }
}

/// Severity of a recorded anomaly signal, persisted to `anomaly-signals.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalySeverity {
    Info,
    Warning,
    Critical,
}

/// A single entry in the persisted `anomaly-signals.json` file (spec §6),
/// capped at 50 entries with oldest-dropped eviction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalySignal {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: AnomalySeverity,
    pub action: String,
    pub short_id: Option<String>,
    pub process_id: Option<u32>,
    pub message: String,
    pub timestamp: i64,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

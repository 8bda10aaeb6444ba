// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Attempt` entity: one concrete execution of a task. Multiple attempts
//! may exist per task; the most recent wins for sync-session purposes, but an
//! older attempt may own the merged PR.

use crate::id::{AttemptId, SessionId, TaskId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Running,
    Review,
    ManualReview,
    Error,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: AttemptId,
    pub task_id: TaskId,
    pub branch: String,
    pub status: AttemptStatus,
    pub worktree_path: Option<PathBuf>,
    pub session_id: Option<SessionId>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// Picks the attempt that should govern sync-session state for a task: the
/// one most recently updated. Ties break on creation time, newest first.
pub fn most_recent<'a>(attempts: impl IntoIterator<Item = &'a Attempt>) -> Option<&'a Attempt> {
    attempts
        .into_iter()
        .max_by_key(|a| (a.updated_at_ms, a.created_at_ms))
}

#[cfg(test)]
#[path = "attempt_tests.rs"]
mod tests;

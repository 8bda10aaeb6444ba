// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External Task Board adapter (spec §6): status lookups by id, attempt
//! listings (including archived attempts the supervisor's own status
//! snapshot has already dropped), and the rebase/resolve/archive/PR-create
//! action surface.

use crate::pr_host::ApiResult;
use async_trait::async_trait;
use bosun_core::{Attempt, TaskId, TaskStatus};

/// The external task board's action surface for one attempt.
#[async_trait]
pub trait TaskBoard: Send + Sync + 'static {
    async fn get_status(&self, task_id: &TaskId) -> ApiResult<TaskStatus>;
    /// All attempts known to the board for a task, including archived ones
    /// the in-process supervisor snapshot no longer tracks.
    async fn list_attempts(&self, task_id: &TaskId) -> ApiResult<Vec<Attempt>>;
    async fn rebase(&self, attempt_id: &str) -> ApiResult<()>;
    async fn resolve_conflict(&self, attempt_id: &str) -> ApiResult<()>;
    async fn archive(&self, attempt_id: &str) -> ApiResult<()>;
    async fn create_pr(&self, attempt_id: &str) -> ApiResult<u64>;
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTaskBoard;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeTaskBoard {
        attempts: Arc<Mutex<HashMap<String, Vec<Attempt>>>>,
        statuses: Arc<Mutex<HashMap<String, TaskStatus>>>,
    }

    impl FakeTaskBoard {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seed_attempts(&self, task_id: &TaskId, attempts: Vec<Attempt>) {
            self.attempts
                .lock()
                .insert(task_id.as_str().to_string(), attempts);
        }

        pub fn seed_status(&self, task_id: &TaskId, status: TaskStatus) {
            self.statuses
                .lock()
                .insert(task_id.as_str().to_string(), status);
        }
    }

    #[async_trait]
    impl TaskBoard for FakeTaskBoard {
        async fn get_status(&self, task_id: &TaskId) -> ApiResult<TaskStatus> {
            match self.statuses.lock().get(task_id.as_str()).copied() {
                Some(status) => ApiResult::success(status, 1),
                None => ApiResult::failure(
                    crate::pr_host::ApiError::Permanent("unknown task".to_string()),
                    1,
                ),
            }
        }

        async fn list_attempts(&self, task_id: &TaskId) -> ApiResult<Vec<Attempt>> {
            let attempts = self
                .attempts
                .lock()
                .get(task_id.as_str())
                .cloned()
                .unwrap_or_default();
            ApiResult::success(attempts, 1)
        }

        async fn rebase(&self, _attempt_id: &str) -> ApiResult<()> {
            ApiResult::success((), 1)
        }

        async fn resolve_conflict(&self, _attempt_id: &str) -> ApiResult<()> {
            ApiResult::success((), 1)
        }

        async fn archive(&self, _attempt_id: &str) -> ApiResult<()> {
            ApiResult::success((), 1)
        }

        async fn create_pr(&self, _attempt_id: &str) -> ApiResult<u64> {
            ApiResult::success(1, 1)
        }
    }
}

#[cfg(test)]
#[path = "task_board_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task Store adapter (spec §6 "External Interfaces"): the injected,
//! eventually-consistent view of tasks. The core never assumes
//! transactional guarantees and always re-fetches live status before
//! acting on a stale read.

use async_trait::async_trait;
use bosun_core::{Task, TaskId, TaskStatus};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskStoreError {
    #[error("task store request failed: {0}")]
    RequestFailed(String),
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

/// Source of a status transition, recorded for audit/observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionSource {
    Reconciler,
    Supervisor,
    Manual,
}

/// A bounded summary of store-wide counts, used by the status-board
/// listener and the secondary supervisor's digest payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStoreStats {
    pub todo: usize,
    pub in_progress: usize,
    pub in_review: usize,
    pub done: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub branch: Option<String>,
    pub base_branch: Option<String>,
    pub pr_number: Option<u64>,
    pub description: Option<String>,
    pub labels: Option<Vec<String>>,
    pub meta: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub struct ReviewResult {
    pub approved: bool,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub meta: HashMap<String, serde_json::Value>,
}

/// The external task store: `getTask`, `getTasksByStatus`, `getAllTasks`,
/// `addTask`, `setTaskStatus`, `updateTask`, `setReviewResult`,
/// `getTasksPendingReview`, `getStats`.
#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>, TaskStoreError>;
    async fn get_tasks_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, TaskStoreError>;
    async fn get_all_tasks(&self) -> Result<Vec<Task>, TaskStoreError>;
    async fn add_task(&self, task: NewTask) -> Result<Task, TaskStoreError>;
    async fn set_task_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        source: TransitionSource,
    ) -> Result<(), TaskStoreError>;
    async fn update_task(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, TaskStoreError>;
    async fn set_review_result(
        &self,
        id: &TaskId,
        result: ReviewResult,
    ) -> Result<(), TaskStoreError>;
    async fn get_tasks_pending_review(&self) -> Result<Vec<Task>, TaskStoreError>;
    async fn get_stats(&self) -> Result<TaskStoreStats, TaskStoreError>;
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTaskStore;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap as Map;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeTaskStore {
        tasks: Arc<Mutex<Map<TaskId, Task>>>,
    }

    impl FakeTaskStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seed(&self, task: Task) {
            self.tasks.lock().insert(task.id.clone(), task);
        }
    }

    #[async_trait]
    impl TaskStore for FakeTaskStore {
        async fn get_task(&self, id: &TaskId) -> Result<Option<Task>, TaskStoreError> {
            Ok(self.tasks.lock().get(id).cloned())
        }

        async fn get_tasks_by_status(
            &self,
            status: TaskStatus,
        ) -> Result<Vec<Task>, TaskStoreError> {
            Ok(self
                .tasks
                .lock()
                .values()
                .filter(|t| t.status == status)
                .cloned()
                .collect())
        }

        async fn get_all_tasks(&self) -> Result<Vec<Task>, TaskStoreError> {
            Ok(self.tasks.lock().values().cloned().collect())
        }

        async fn add_task(&self, task: NewTask) -> Result<Task, TaskStoreError> {
            let full = Task {
                id: task.id.clone(),
                title: task.title,
                status: task.status,
                branch: None,
                base_branch: None,
                pr_number: None,
                updated_at_ms: 0,
                description: task.description,
                labels: Vec::new(),
                meta: task.meta,
            };
            self.tasks.lock().insert(task.id, full.clone());
            Ok(full)
        }

        async fn set_task_status(
            &self,
            id: &TaskId,
            status: TaskStatus,
            _source: TransitionSource,
        ) -> Result<(), TaskStoreError> {
            let mut tasks = self.tasks.lock();
            let task = tasks.get_mut(id).ok_or_else(|| TaskStoreError::NotFound(id.clone()))?;
            task.status = status;
            Ok(())
        }

        async fn update_task(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, TaskStoreError> {
            let mut tasks = self.tasks.lock();
            let task = tasks.get_mut(id).ok_or_else(|| TaskStoreError::NotFound(id.clone()))?;
            if let Some(title) = patch.title {
                task.title = title;
            }
            if let Some(branch) = patch.branch {
                task.branch = Some(branch);
            }
            if let Some(base_branch) = patch.base_branch {
                task.base_branch = Some(base_branch);
            }
            if let Some(pr_number) = patch.pr_number {
                task.pr_number = Some(pr_number);
            }
            if let Some(description) = patch.description {
                task.description = Some(description);
            }
            if let Some(labels) = patch.labels {
                task.labels = labels;
            }
            if let Some(meta) = patch.meta {
                task.meta = meta;
            }
            Ok(task.clone())
        }

        async fn set_review_result(
            &self,
            id: &TaskId,
            _result: ReviewResult,
        ) -> Result<(), TaskStoreError> {
            if !self.tasks.lock().contains_key(id) {
                return Err(TaskStoreError::NotFound(id.clone()));
            }
            Ok(())
        }

        async fn get_tasks_pending_review(&self) -> Result<Vec<Task>, TaskStoreError> {
            self.get_tasks_by_status(TaskStatus::InReview).await
        }

        async fn get_stats(&self) -> Result<TaskStoreStats, TaskStoreError> {
            let tasks = self.tasks.lock();
            let mut stats = TaskStoreStats::default();
            for task in tasks.values() {
                match task.status {
                    TaskStatus::Todo => stats.todo += 1,
                    TaskStatus::InProgress => stats.in_progress += 1,
                    TaskStatus::InReview => stats.in_review += 1,
                    TaskStatus::Done => stats.done += 1,
                    TaskStatus::Cancelled => stats.cancelled += 1,
                }
            }
            Ok(stats)
        }
    }
}

#[cfg(test)]
#[path = "task_store_tests.rs"]
mod tests;

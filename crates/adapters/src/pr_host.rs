// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PR Host adapter (spec §6): PR lookup by number or branch, PR list, PR
//! merge. Every call returns an `ApiResult` envelope so callers can inspect
//! error bodies for retryability without matching on transport errors.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Uniform response envelope for every external-host call (spec §6).
#[derive(Debug, Clone)]
pub struct ApiResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub elapsed_ms: u64,
    pub error: Option<ApiError>,
}

impl<T> ApiResult<T> {
    pub fn success(data: T, elapsed_ms: u64) -> Self {
        Self {
            ok: true,
            data: Some(data),
            elapsed_ms,
            error: None,
        }
    }

    pub fn failure(error: ApiError, elapsed_ms: u64) -> Self {
        Self {
            ok: false,
            data: None,
            elapsed_ms,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("transient: {0}")]
    Transient(String),
    #[error("permanent: {0}")]
    Permanent(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// Whether a failure of this kind warrants a retry (spec §7: "Expected
    /// transient (network, timeout, 5xx)" vs "Expected permanent").
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transient(_) | ApiError::Timeout(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    Merged,
    OpenClean,
    OpenConflicted,
    Closed,
}

#[derive(Debug, Clone)]
pub struct PullRequest {
    pub number: u64,
    pub branch: String,
    pub base_branch: String,
    pub state: MergeState,
    pub updated_at_ms: i64,
}

/// The PR-host side of spec §6's "External Task Board / PR Host".
#[async_trait]
pub trait PrHost: Send + Sync + 'static {
    async fn get_by_number(&self, number: u64) -> ApiResult<PullRequest>;
    async fn get_by_branch(&self, branch: &str) -> ApiResult<Option<PullRequest>>;
    async fn list_open(&self) -> ApiResult<Vec<PullRequest>>;
    /// `true` if `branch` has been merged into `base` at any point in
    /// history, independent of whether a PR record still references it.
    async fn is_branch_merged_into_base(&self, branch: &str, base: &str) -> ApiResult<bool>;
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePrHost;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakePrHost {
        by_number: Arc<Mutex<HashMap<u64, PullRequest>>>,
        merged_branches: Arc<Mutex<HashMap<String, String>>>,
    }

    impl FakePrHost {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seed_pr(&self, pr: PullRequest) {
            self.by_number.lock().insert(pr.number, pr);
        }

        pub fn seed_merged(&self, branch: impl Into<String>, base: impl Into<String>) {
            self.merged_branches.lock().insert(branch.into(), base.into());
        }
    }

    #[async_trait]
    impl PrHost for FakePrHost {
        async fn get_by_number(&self, number: u64) -> ApiResult<PullRequest> {
            match self.by_number.lock().get(&number).cloned() {
                Some(pr) => ApiResult::success(pr, 1),
                None => ApiResult::failure(ApiError::Permanent(format!("no PR #{number}")), 1),
            }
        }

        async fn get_by_branch(&self, branch: &str) -> ApiResult<Option<PullRequest>> {
            let found = self
                .by_number
                .lock()
                .values()
                .find(|pr| pr.branch == branch)
                .cloned();
            ApiResult::success(found, 1)
        }

        async fn list_open(&self) -> ApiResult<Vec<PullRequest>> {
            let open = self
                .by_number
                .lock()
                .values()
                .filter(|pr| matches!(pr.state, MergeState::OpenClean | MergeState::OpenConflicted))
                .cloned()
                .collect();
            ApiResult::success(open, 1)
        }

        async fn is_branch_merged_into_base(&self, branch: &str, base: &str) -> ApiResult<bool> {
            let merged = self
                .merged_branches
                .lock()
                .get(branch)
                .is_some_and(|recorded_base| recorded_base == base);
            ApiResult::success(merged, 1)
        }
    }
}

#[cfg(test)]
#[path = "pr_host_tests.rs"]
mod tests;

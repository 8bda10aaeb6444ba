// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External-system adapters: the trait + fake pairs the engine and daemon
//! crates depend on instead of talking to task stores, PR hosts, task
//! boards, child processes, and desktop notifications directly.

mod child_process;
mod notify;
mod pr_host;
mod task_board;
mod task_store;

pub use child_process::{
    ChildHandle, ChildProcessError, ChildProcessSpawner, ExitOutcome, TokioChildProcessSpawner,
    TERMINATE_ESCALATION_DELAY,
};
pub use notify::{DesktopNotifyAdapter, NoOpNotifyAdapter, NotifyAdapter, NotifyError};
pub use pr_host::{ApiError, ApiResult, MergeState, PrHost, PullRequest};
pub use task_board::TaskBoard;
pub use task_store::{
    NewTask, ReviewResult, TaskPatch, TaskStore, TaskStoreError, TaskStoreStats, TransitionSource,
};

#[cfg(any(test, feature = "test-support"))]
pub use child_process::FakeChildProcessSpawner;
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use pr_host::FakePrHost;
#[cfg(any(test, feature = "test-support"))]
pub use task_board::FakeTaskBoard;
#[cfg(any(test, feature = "test-support"))]
pub use task_store::FakeTaskStore;

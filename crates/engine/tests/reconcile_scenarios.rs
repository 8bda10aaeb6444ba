// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios from spec §8, expressed against the public
//! `bosun-engine` API and the fakes in `bosun-adapters`.

use bosun_adapters::{FakePrHost, FakeTaskBoard, FakeTaskStore, MergeState, PullRequest};
use bosun_core::{FakeClock, TaskId, TaskStatus};
use bosun_engine::{EventDispatcher, ListenerRegistry, Reconciler, ReconcilerCaches, ReconcilerConfig, TaskOutcome, Verbosity};
use bosun_storage::{ConflictCooldownCache, MergedBranchCache, MergedTaskIdCache, RecoveryCache};
use std::collections::HashMap;
use std::sync::Arc;

fn task_inreview(id: &str, branch: &str, pr_number: u64) -> bosun_core::Task {
    bosun_core::Task {
        id: TaskId::new(id),
        title: "ship it".to_string(),
        status: TaskStatus::InReview,
        branch: Some(branch.to_string()),
        base_branch: None,
        pr_number: Some(pr_number),
        updated_at_ms: 0,
        description: None,
        labels: Vec::new(),
        meta: HashMap::new(),
    }
}

#[tokio::test]
async fn scenario_1_task_completed_via_pr_merge() {
    let clock = FakeClock::at(0);
    let task_store = Arc::new(FakeTaskStore::new());
    let pr_host = Arc::new(FakePrHost::new());
    let task_board = Arc::new(FakeTaskBoard::new());
    let dir = tempfile::tempdir().expect("tempdir");
    let caches = ReconcilerCaches {
        recovery: RecoveryCache::load(dir.path().join("recovery.json")),
        merged_branch: MergedBranchCache::load(dir.path().join("merged-branch.json")),
        merged_task_id: MergedTaskIdCache::load(dir.path().join("merged-task-id.json")),
        conflict_cooldown: ConflictCooldownCache::load(dir.path().join("conflict-cooldown.json")),
    };
    let dispatcher = Arc::new(EventDispatcher::new(clock.clone(), Verbosity::Detailed, ListenerRegistry::new()));

    let task = task_inreview("abc", "ve/abc-feat", 42);
    task_store.seed(task.clone());
    pr_host.seed_pr(PullRequest {
        number: 42,
        branch: "ve/abc-feat".to_string(),
        base_branch: "main".to_string(),
        state: MergeState::Merged,
        updated_at_ms: 0,
    });

    let mut config = ReconcilerConfig::default();
    config.pr_host_throttle_ms = 0;
    let reconciler = Reconciler::new(clock, task_store.clone(), pr_host, task_board, caches, dispatcher.clone(), config);

    let outcome = reconciler.reconcile_task(&task, &[]).await;
    assert_eq!(outcome, TaskOutcome::MarkedDone { pr_number: 42 });

    let updated = task_store.get_task(&task.id).await.unwrap().unwrap();
    assert_eq!(updated.status, TaskStatus::Done);
}

#[tokio::test]
async fn scenario_6_event_dispatcher_dedup_ignores_volatile_segment() {
    let clock = FakeClock::at(0);
    let dispatcher = EventDispatcher::new(clock.clone(), Verbosity::Detailed, ListenerRegistry::new());

    let first = dispatcher.dispatch(
        bosun_core::Event::ErrorDetected {
            fingerprint: "xyz".to_string(),
            message: "error: connection reset".to_string(),
        },
        bosun_engine::DispatchOptions {
            dedup_key: Some("err-abc123-42".to_string()),
            priority: None,
            skip_dedup: false,
        },
    );
    assert!(first);

    clock.advance(std::time::Duration::from_millis(10_000));

    let normalized_a = bosun_engine::normalize_dedup_key("err-abc123-42");
    let normalized_b = bosun_engine::normalize_dedup_key("err-abc456-42");
    assert_eq!(normalized_a, normalized_b);

    let second = dispatcher.dispatch(
        bosun_core::Event::ErrorDetected {
            fingerprint: "xyz".to_string(),
            message: "error: connection reset".to_string(),
        },
        bosun_engine::DispatchOptions {
            dedup_key: Some("err-abc456-42".to_string()),
            priority: None,
            skip_dedup: false,
        },
    );
    assert!(!second);
    assert_eq!(dispatcher.dispatch_count(), 1);
}

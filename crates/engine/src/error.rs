// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine control plane.

use thiserror::Error;

/// Errors that can occur while reconciling, dispatching, or supervising.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("task store error: {0}")]
    TaskStore(String),
    #[error("pr host error: {0}")]
    PrHost(String),
    #[error("task board error: {0}")]
    TaskBoard(String),
    #[error("child process error: {0}")]
    ChildProcess(String),
    #[error("cache error: {0}")]
    Cache(#[from] bosun_storage::CacheError),
    #[error("source watch error: {0}")]
    SourceWatch(String),
    #[error("reconcile already in progress")]
    ReconcileReentrant,
}

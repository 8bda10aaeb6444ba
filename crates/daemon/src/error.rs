// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for daemon startup, locking, and supervision.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to acquire lock: another bosun instance is already running for this repo")]
    LockFailed(#[source] std::io::Error),
    #[error("could not resolve a state directory (HOME not set and no explicit override given)")]
    NoStateDir,
    #[error("preflight check failed: {0}")]
    PreflightFailed(String),
    #[error("engine error: {0}")]
    Engine(#[from] bosun_engine::EngineError),
    #[error("child process error: {0}")]
    ChildProcess(#[from] bosun_adapters::ChildProcessError),
}

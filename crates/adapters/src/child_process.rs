// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child process adapter (spec §6 "Child process contract", §4.1
//! Supervisor): spawns the orchestrator child with piped stdio, hands the
//! core chunked stdout/stderr to feed the Child I/O Pipeline, and exposes
//! SIGTERM-then-SIGKILL termination.

use async_trait::async_trait;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

#[derive(Debug, Error)]
pub enum ChildProcessError {
    #[error("failed to spawn: {0}")]
    SpawnFailed(#[from] io::Error),
}

/// How a child exited, mirroring spec §6's recognized exit codes (`0`
/// clean, `75` the self-restart re-fork signal, any other nonzero
/// abnormal) plus a signal when the platform reports one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl Default for ExitOutcome {
    fn default() -> Self {
        Self {
            code: Some(0),
            signal: None,
        }
    }
}

impl ExitOutcome {
    pub const SELF_RESTART_CODE: i32 = 75;

    pub fn is_clean(&self) -> bool {
        self.code == Some(0) && self.signal.is_none()
    }

    pub fn is_self_restart(&self) -> bool {
        self.code == Some(Self::SELF_RESTART_CODE)
    }
}

/// A single live child process. Stdout/stderr are read independently so
/// the caller can interleave them through the classifier as they arrive.
#[async_trait]
pub trait ChildHandle: Send {
    fn pid(&self) -> Option<u32>;
    /// Read the next available chunk of stdout, or `None` at EOF.
    async fn read_stdout_chunk(&mut self) -> io::Result<Option<Vec<u8>>>;
    async fn read_stderr_chunk(&mut self) -> io::Result<Option<Vec<u8>>>;
    async fn wait(&mut self) -> io::Result<ExitOutcome>;
    async fn terminate(&mut self) -> io::Result<()>;
    async fn kill(&mut self) -> io::Result<()>;
}

/// Spawns the real child orchestrator process.
#[async_trait]
pub trait ChildProcessSpawner: Send + Sync + 'static {
    async fn spawn(
        &self,
        script: &str,
        args: &[String],
    ) -> Result<Box<dyn ChildHandle>, ChildProcessError>;
}

const READ_CHUNK_SIZE: usize = 8192;

pub struct TokioChildHandle {
    child: Child,
}

#[async_trait]
impl ChildHandle for TokioChildHandle {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    async fn read_stdout_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        read_chunk(self.child.stdout.as_mut()).await
    }

    async fn read_stderr_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        read_chunk(self.child.stderr.as_mut()).await
    }

    async fn wait(&mut self) -> io::Result<ExitOutcome> {
        let status = self.child.wait().await?;
        Ok(ExitOutcome {
            code: status.code(),
            #[cfg(unix)]
            signal: std::os::unix::process::ExitStatusExt::signal(&status),
            #[cfg(not(unix))]
            signal: None,
        })
    }

    async fn terminate(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            if let Some(pid) = self.child.id() {
                send_signal("-15", pid);
            }
            Ok(())
        }
        #[cfg(not(unix))]
        {
            self.child.start_kill()
        }
    }

    async fn kill(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }
}

/// Shells out to the `kill` binary rather than linking a signal crate,
/// matching how the rest of this codebase sends process signals.
#[cfg(unix)]
fn send_signal(signal: &str, pid: u32) -> bool {
    std::process::Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

async fn read_chunk<R: tokio::io::AsyncRead + Unpin>(
    stream: Option<&mut R>,
) -> io::Result<Option<Vec<u8>>> {
    let Some(stream) = stream else {
        return Ok(None);
    };
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    buf.truncate(n);
    Ok(Some(buf))
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TokioChildProcessSpawner;

#[async_trait]
impl ChildProcessSpawner for TokioChildProcessSpawner {
    async fn spawn(
        &self,
        script: &str,
        args: &[String],
    ) -> Result<Box<dyn ChildHandle>, ChildProcessError> {
        let child = Command::new(script)
            .args(args)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        Ok(Box::new(TokioChildHandle { child }))
    }
}

/// 3-second grace period between SIGTERM and escalating to SIGKILL (spec
/// §5 "terminated by SIGTERM with a 3s escalation to SIGKILL").
pub const TERMINATE_ESCALATION_DELAY: Duration = Duration::from_secs(3);

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeChildProcessSpawner;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// A scripted child: the test preloads stdout/stderr chunks and an
    /// exit outcome; `spawn` replays them.
    #[derive(Clone, Default)]
    pub struct FakeChildProcessSpawner {
        script: Arc<Mutex<FakeScript>>,
    }

    #[derive(Default)]
    struct FakeScript {
        stdout_chunks: VecDeque<Vec<u8>>,
        stderr_chunks: VecDeque<Vec<u8>>,
        exit: ExitOutcome,
    }

    impl FakeChildProcessSpawner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_stdout(&self, chunk: impl Into<Vec<u8>>) {
            self.script.lock().stdout_chunks.push_back(chunk.into());
        }

        pub fn push_stderr(&self, chunk: impl Into<Vec<u8>>) {
            self.script.lock().stderr_chunks.push_back(chunk.into());
        }

        pub fn set_exit(&self, outcome: ExitOutcome) {
            self.script.lock().exit = outcome;
        }
    }

    struct FakeChildHandle {
        script: Arc<Mutex<FakeScript>>,
        terminated: bool,
        killed: bool,
    }

    #[async_trait]
    impl ChildHandle for FakeChildHandle {
        fn pid(&self) -> Option<u32> {
            Some(4242)
        }

        async fn read_stdout_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
            Ok(self.script.lock().stdout_chunks.pop_front())
        }

        async fn read_stderr_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
            Ok(self.script.lock().stderr_chunks.pop_front())
        }

        async fn wait(&mut self) -> io::Result<ExitOutcome> {
            Ok(self.script.lock().exit)
        }

        async fn terminate(&mut self) -> io::Result<()> {
            self.terminated = true;
            Ok(())
        }

        async fn kill(&mut self) -> io::Result<()> {
            self.killed = true;
            Ok(())
        }
    }

    #[async_trait]
    impl ChildProcessSpawner for FakeChildProcessSpawner {
        async fn spawn(
            &self,
            _script: &str,
            _args: &[String],
        ) -> Result<Box<dyn ChildHandle>, ChildProcessError> {
            Ok(Box::new(FakeChildHandle {
                script: self.script.clone(),
                terminated: false,
                killed: false,
            }))
        }
    }
}

#[cfg(test)]
#[path = "child_process_tests.rs"]
mod tests;

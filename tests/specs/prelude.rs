//! Test helpers for behavioral specifications.
//!
//! Black-box: spawns the real `bosund` binary against a temp repo root and
//! inspects its observable effects (log file, lock file, exit code).

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::Duration;

pub const SPEC_POLL_INTERVAL_MS: u64 = 20;
pub const SPEC_WAIT_MAX_MS: u64 = 4_000;

/// Resolves a binary built alongside this test harness.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

pub fn bosund_binary() -> PathBuf {
    binary_path("bosund")
}

/// Poll a condition until it returns true or the timeout elapses.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    let poll = Duration::from_millis(SPEC_POLL_INTERVAL_MS);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll);
    }
    false
}

pub fn kill_signal(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn process_exists(pid: u32) -> bool {
    kill_signal("-0", pid)
}

/// A temp repo root bosund supervises.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.path().join(".bosun").join(".cache")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.cache_dir().join("monitor-lock")
    }

    pub fn log_path(&self) -> PathBuf {
        self.cache_dir().join("logs").join("bosun.log")
    }

    pub fn log_contents(&self) -> String {
        std::fs::read_to_string(self.log_path()).unwrap_or_else(|_| "(no log yet)".to_string())
    }

    /// Writes an executable shell script at `<repo_root>/<name>`.
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        }
        path
    }

    fn bosund_command(&self, script: &Path, extra_args: &[&str]) -> Command {
        let mut cmd = Command::new(bosund_binary());
        cmd.current_dir(self.path());
        cmd.arg("--script").arg(script);
        cmd.args(extra_args);
        cmd
    }

    /// Runs bosund to completion (for paths that exit quickly: preflight
    /// failure, duplicate-start rejection).
    pub fn run(&self, script: &Path, extra_args: &[&str]) -> Output {
        self.bosund_command(script, extra_args)
            .output()
            .expect("bosund should run")
    }

    /// Spawns bosund in the background and waits for its `READY` marker on
    /// stdout before returning the handle.
    pub fn spawn(&self, script: &Path, extra_args: &[&str]) -> BosundProcess {
        let mut cmd = self.bosund_command(script, extra_args);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        let mut child = cmd.spawn().expect("bosund should spawn");
        let pid = child.id();

        let ready = wait_for(SPEC_WAIT_MAX_MS, || self.lock_path().exists());
        assert!(ready, "bosund should acquire its lock file after starting");
        let _ = child.stdout.take();

        BosundProcess { child, pid }
    }
}

pub struct BosundProcess {
    child: Child,
    pid: u32,
}

impl BosundProcess {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn terminate_and_wait(mut self) {
        kill_signal("-15", self.pid);
        let exited = wait_for(SPEC_WAIT_MAX_MS, || !process_exists(self.pid));
        assert!(exited, "bosund should exit after SIGTERM");
        let _ = self.child.wait();
    }
}

impl Drop for BosundProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

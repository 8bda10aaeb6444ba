// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem lock guaranteeing only one supervisor instance runs per repo
//! root (spec §5 "shared-resource policy"). A duplicate start is treated as
//! a benign exit, never an error the caller needs to notice loudly.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::DaemonError;

/// The exclusive lock file handle. Held only to keep the OS-level lock
/// alive; released automatically on drop.
#[allow(dead_code)]
pub struct DaemonLock {
    file: File,
}

impl DaemonLock {
    /// Attempts to acquire the exclusive lock at `lock_path`, writing this
    /// process's pid into it on success. Uses `OpenOptions` rather than
    /// truncating up front so a failed acquisition never wipes the running
    /// daemon's pid out from under it.
    pub fn acquire(lock_path: &Path) -> Result<Self, DaemonError> {
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)?;
        file.try_lock_exclusive().map_err(DaemonError::LockFailed)?;

        let mut file = file;
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;

        Ok(Self { file })
    }
}

/// Reads the pid recorded by whichever process currently holds (or last
/// held) the lock file, for the duplicate-start notice. Returns `None` if
/// the file is missing or unreadable — the spec's open question on
/// lock-file deletion-then-rewrite races is resolved by treating a missing
/// read as "unknown owner" rather than guessing.
pub fn read_owner_pid(lock_path: &Path) -> Option<u32> {
    std::fs::read_to_string(lock_path)
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;

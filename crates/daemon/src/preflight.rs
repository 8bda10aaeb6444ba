// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Preflight (spec §4.1): sanity-checks the child script before every
//! spawn attempt. A failure here schedules a retry after
//! `preflightRetryMs` instead of spawning a child doomed to fail instantly.

use std::path::Path;

use crate::error::DaemonError;

pub const DEFAULT_PREFLIGHT_RETRY_MS: i64 = 10_000;

/// Checks that `script_path` exists and (on unix) is executable.
pub fn run(script_path: &Path) -> Result<(), DaemonError> {
    if !script_path.exists() {
        return Err(DaemonError::PreflightFailed(format!(
            "script not found: {}",
            script_path.display()
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let meta = std::fs::metadata(script_path)?;
        if meta.permissions().mode() & 0o111 == 0 {
            return Err(DaemonError::PreflightFailed(format!(
                "script is not executable: {}",
                script_path.display()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "preflight_tests.rs"]
mod tests;

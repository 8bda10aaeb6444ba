// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves which `bosund` binary this wrapper should hand control to.
//! Mirrors the sibling-binary resolution the workspace already uses for its
//! dev-build layout, plus an explicit override for packaging.

use std::path::PathBuf;

/// Finds the `bosund` binary to exec into: explicit override, a debug-build
/// sibling under `target/debug`, a release-build sibling next to this
/// binary, then a bare `bosund` resolved off `PATH`.
pub fn find_bosund_binary() -> PathBuf {
    if let Ok(path) = std::env::var("BOSUN_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    let current_exe = std::env::current_exe().ok();

    let is_debug_build = current_exe
        .as_ref()
        .and_then(|p| p.to_str())
        .map(|s| s.contains("target/debug"))
        .unwrap_or(false);

    if is_debug_build {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let dev_path = PathBuf::from(manifest_dir)
                .parent()
                .and_then(|p| p.parent())
                .map(|p| p.join("target/debug/bosund"));
            if let Some(path) = dev_path {
                if path.exists() {
                    return path;
                }
            }
        }
    }

    if let Some(exe) = &current_exe {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("bosund");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from("bosund")
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bosun` — thin CLI wrapper around the `bosund` supervisor binary.
//!
//! Parses and validates the supervisor's flags, resolves which `bosund` to
//! run, then replaces this process with it so exit codes, signals, and
//! stdio pass straight through (spec §6's `0` clean / `75` self-restart /
//! nonzero abnormal contract).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod daemon_process;

use clap::Parser;
use std::path::PathBuf;

use daemon_process::find_bosund_binary;

/// Long-lived AI-agent fleet orchestration supervisor.
#[derive(Debug, Parser)]
#[command(name = "bosun", version)]
struct Cli {
    /// Path to the orchestrator script bosund spawns as its child.
    #[arg(long, default_value = "bosun-child")]
    script: PathBuf,

    /// Arguments passed through to the child script. Must come last: every
    /// token after `--args` is forwarded verbatim, including ones that look
    /// like other bosun flags.
    #[arg(long, num_args = 0.., allow_hyphen_values = true)]
    args: Vec<String>,

    /// Disable the source-change watcher (no self-restart on source edits).
    #[arg(long)]
    no_watch: bool,

    /// Disable Codex-specific child integration.
    #[arg(long)]
    no_codex: bool,

    /// Override the directory bosund writes its log file into.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn into_argv(self) -> Vec<String> {
        let mut argv = vec!["--script".to_string(), self.script.to_string_lossy().into_owned()];
        if !self.args.is_empty() {
            argv.push("--args".to_string());
            argv.extend(self.args);
        }
        if self.no_watch {
            argv.push("--no-watch".to_string());
        }
        if self.no_codex {
            argv.push("--no-codex".to_string());
        }
        if let Some(dir) = self.log_dir {
            argv.push("--log-dir".to_string());
            argv.push(dir.to_string_lossy().into_owned());
        }
        argv
    }
}

fn main() {
    let cli = Cli::parse();

    let bosund = find_bosund_binary();
    let argv = cli.into_argv();

    if let Err(e) = exec_bosund(&bosund, &argv) {
        eprintln!("bosun: failed to launch bosund at {}: {e}", bosund.display());
        std::process::exit(1);
    }
}

#[cfg(unix)]
fn exec_bosund(bosund: &PathBuf, argv: &[String]) -> std::io::Result<std::convert::Infallible> {
    use std::os::unix::process::CommandExt;
    let err = std::process::Command::new(bosund).args(argv).exec();
    Err(err)
}

#[cfg(not(unix))]
fn exec_bosund(bosund: &PathBuf, argv: &[String]) -> std::io::Result<std::convert::Infallible> {
    let status = std::process::Command::new(bosund).args(argv).status()?;
    std::process::exit(status.code().unwrap_or(1));
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

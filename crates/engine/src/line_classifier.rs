// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line classifier (spec §4.8, §6 "Child process contract"): turns one line
//! of child stdout/stderr into a classification the Child I/O Pipeline acts
//! on — a recognized marker, a genuine error, or suppressed noise.

use std::sync::LazyLock;

/// What a single child log line means to the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// `"Merged PR #<n>"`.
    MergedPr { pr_number: u64 },
    /// `"Merge notify: PR #<n> stage=…"`.
    MergeNotify { pr_number: u64, stage: String },
    /// `"Tracking new attempt: <shortId> → <branch>"`.
    AttemptTracked { short_id: String, branch: String },
    /// `"Attempt <shortId> finished (completed|failed)"`.
    AttemptFinished { short_id: String, completed: bool },
    /// `"No remote branch for <branch>"`.
    NoRemoteBranch { branch: String },
    /// `"ALL TASKS COMPLETE"`.
    BacklogEmpty,
    /// `"Another orchestrator instance is already running"`.
    AnotherInstanceRunning,
    /// Context-window exhaustion pattern.
    ContextWindowExhausted,
    /// A genuine error line, worth dispatching and loop-tracking.
    Error { fingerprint: String },
    /// A known-benign line (periodic status, `errors=0`, lifecycle chatter).
    Noise,
    /// Anything else: logged but not otherwise acted on.
    Plain,
}

static MERGED_PR: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"Merged PR #(\d+)").expect("valid regex"));
static MERGE_NOTIFY: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"Merge notify: PR #(\d+) stage=(\S+)").expect("valid regex")
});
static ATTEMPT_TRACKED: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"Tracking new attempt: (\S+) [→>-]+ (\S+)").expect("valid regex")
});
static ATTEMPT_FINISHED: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"Attempt (\S+) finished \((completed|failed)\)").expect("valid regex")
});
static NO_REMOTE_BRANCH: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"No remote branch for (\S+)").expect("valid regex"));

static NOISE_SUBSTRINGS: &[&str] = &["errors=0", "heartbeat", "status update", "status-update"];
static CONTEXT_EXHAUSTED_SUBSTRINGS: &[&str] =
    &["context length exceeded", "context window exhausted", "maximum context length"];
static ERROR_SUBSTRINGS: &[&str] = &["error", "exception", "traceback", "panicked at"];

fn fingerprint(line: &str) -> String {
    bosun_core::fingerprint::fingerprint(line)
}

/// Classify one already-trimmed line of child output.
pub fn classify(line: &str) -> LineClass {
    if line.contains("ALL TASKS COMPLETE") {
        return LineClass::BacklogEmpty;
    }
    if line.contains("Another orchestrator instance is already running") {
        return LineClass::AnotherInstanceRunning;
    }
    if let Some(caps) = MERGED_PR.captures(line) {
        if let Ok(pr_number) = caps[1].parse() {
            return LineClass::MergedPr { pr_number };
        }
    }
    if let Some(caps) = MERGE_NOTIFY.captures(line) {
        if let Ok(pr_number) = caps[1].parse() {
            return LineClass::MergeNotify {
                pr_number,
                stage: caps[2].to_string(),
            };
        }
    }
    if let Some(caps) = ATTEMPT_TRACKED.captures(line) {
        return LineClass::AttemptTracked {
            short_id: caps[1].to_string(),
            branch: caps[2].to_string(),
        };
    }
    if let Some(caps) = ATTEMPT_FINISHED.captures(line) {
        return LineClass::AttemptFinished {
            short_id: caps[1].to_string(),
            completed: &caps[2] == "completed",
        };
    }
    if let Some(caps) = NO_REMOTE_BRANCH.captures(line) {
        return LineClass::NoRemoteBranch {
            branch: caps[1].to_string(),
        };
    }

    let lower = line.to_lowercase();
    if CONTEXT_EXHAUSTED_SUBSTRINGS.iter().any(|p| lower.contains(p)) {
        return LineClass::ContextWindowExhausted;
    }
    if NOISE_SUBSTRINGS.iter().any(|p| lower.contains(p)) {
        return LineClass::Noise;
    }
    if ERROR_SUBSTRINGS.iter().any(|p| lower.contains(p)) {
        return LineClass::Error {
            fingerprint: fingerprint(line),
        };
    }
    LineClass::Plain
}

#[cfg(test)]
#[path = "line_classifier_tests.rs"]
mod tests;

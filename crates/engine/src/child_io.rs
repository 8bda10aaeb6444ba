// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child I/O Pipeline (spec §4.8): consumes the child process's stdout and
//! stderr as byte chunks, reassembles lines across chunk boundaries, fans
//! each line out through the classifier, and dispatches the events that
//! fall out of it.

use crate::dispatcher::{DispatchOptions, EventDispatcher};
use crate::line_classifier::{classify, LineClass};
use crate::loop_detector::LoopDetector;
use crate::restart_controller::RestartController;
use bosun_core::{Clock, Event};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::sync::LazyLock;

static ATTEMPT_SHORT_ID: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\[([0-9a-f]{4,12})\]").expect("valid regex"));

/// Result of feeding one line through the pipeline, for callers (mainly
/// tests) that want to observe side effects without a live dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedLine {
    pub raw: String,
    pub class: LineClass,
    pub attempt_short_id: Option<String>,
}

/// Reassembles a byte stream into lines and classifies each one.
pub struct ChildIoPipeline<C: Clock> {
    clock: C,
    dispatcher: Arc<EventDispatcher<C>>,
    loop_detector: Arc<LoopDetector<C>>,
    restart_controller: Arc<RestartController<C>>,
    active_log_path: PathBuf,
    attempt_log_dir: PathBuf,
    remainder: String,
    last_error_fingerprint: Option<String>,
    last_error_count: AtomicU32,
}

impl<C: Clock> ChildIoPipeline<C> {
    pub fn new(
        clock: C,
        dispatcher: Arc<EventDispatcher<C>>,
        loop_detector: Arc<LoopDetector<C>>,
        restart_controller: Arc<RestartController<C>>,
        active_log_path: PathBuf,
        attempt_log_dir: PathBuf,
    ) -> Self {
        Self {
            clock,
            dispatcher,
            loop_detector,
            restart_controller,
            active_log_path,
            attempt_log_dir,
            remainder: String::new(),
            last_error_fingerprint: None,
            last_error_count: AtomicU32::new(0),
        }
    }

    /// Feed a chunk of stdout/stderr bytes. Invalid UTF-8 is replaced
    /// lossily, matching how line-oriented child output is typically
    /// handled when the child may emit partial multi-byte sequences.
    pub fn ingest_chunk(&mut self, chunk: &[u8]) -> io::Result<Vec<ProcessedLine>> {
        self.remainder.push_str(&String::from_utf8_lossy(chunk));
        let mut processed = Vec::new();

        while let Some(idx) = self.remainder.find('\n') {
            let line = self.remainder[..idx].trim_end_matches('\r').to_string();
            self.remainder.drain(..=idx);
            processed.push(self.process_line(line)?);
        }
        Ok(processed)
    }

    /// Flush any trailing partial line still buffered (used at child exit,
    /// since a child that dies mid-line would otherwise lose that output).
    pub fn flush_remainder(&mut self) -> io::Result<Option<ProcessedLine>> {
        if self.remainder.is_empty() {
            return Ok(None);
        }
        let line = std::mem::take(&mut self.remainder);
        Ok(Some(self.process_line(line)?))
    }

    fn process_line(&mut self, raw: String) -> io::Result<ProcessedLine> {
        let stamped = format!("[{}] {}", self.clock.now_ms(), raw);
        append_line(&self.active_log_path, &stamped)?;

        let attempt_short_id = ATTEMPT_SHORT_ID
            .captures(&raw)
            .map(|c| c[1].to_string());
        if let Some(short_id) = &attempt_short_id {
            let attempt_log_path = self.attempt_log_dir.join(format!("{short_id}.log"));
            append_line(&attempt_log_path, &stamped)?;
        }

        let class = classify(&raw);
        self.handle_class(&class, &raw);

        Ok(ProcessedLine {
            raw,
            class,
            attempt_short_id,
        })
    }

    fn handle_class(&mut self, class: &LineClass, raw: &str) {
        let opts = DispatchOptions::default();
        match class {
            LineClass::MergedPr { pr_number } => {
                self.dispatcher.dispatch(
                    Event::MergedPrMarker {
                        pr_number: *pr_number,
                    },
                    opts,
                );
            }
            LineClass::MergeNotify { pr_number, stage } => {
                self.dispatcher.dispatch(
                    Event::MergeNotifyMarker {
                        pr_number: *pr_number,
                        stage: stage.clone(),
                    },
                    opts,
                );
            }
            LineClass::AttemptTracked { short_id, branch } => {
                self.dispatcher.dispatch(
                    Event::AttemptTracked {
                        short_id: short_id.clone(),
                        branch: branch.clone(),
                    },
                    opts,
                );
            }
            LineClass::AttemptFinished { short_id, completed } => {
                self.dispatcher.dispatch(
                    Event::AttemptFinished {
                        short_id: short_id.clone(),
                        completed: *completed,
                    },
                    opts,
                );
            }
            LineClass::NoRemoteBranch { branch } => {
                self.dispatcher.dispatch(
                    Event::NoRemoteBranch {
                        branch: branch.clone(),
                    },
                    opts,
                );
            }
            LineClass::BacklogEmpty => {
                self.dispatcher.dispatch(Event::BacklogEmpty, opts);
            }
            LineClass::AnotherInstanceRunning => {
                self.restart_controller
                    .note_log_line("another instance is already running");
                self.dispatcher.dispatch(Event::AnotherInstanceRunning, opts);
            }
            LineClass::ContextWindowExhausted => {
                self.dispatcher
                    .dispatch(Event::ContextWindowExhausted { attempt_id: None }, opts);
            }
            LineClass::Error { fingerprint } => {
                self.last_error_fingerprint = Some(fingerprint.clone());
                self.last_error_count.fetch_add(1, Ordering::Relaxed);
                self.dispatcher.dispatch(
                    Event::ErrorDetected {
                        fingerprint: fingerprint.clone(),
                        message: raw.to_string(),
                    },
                    opts,
                );
                if self.loop_detector.record(fingerprint) {
                    self.dispatcher.dispatch(
                        Event::ErrorLoopDetected {
                            fingerprint: fingerprint.clone(),
                            count: self.loop_detector.occurrence_count(fingerprint) as u32,
                        },
                        DispatchOptions::default(),
                    );
                }
            }
            LineClass::Noise | LineClass::Plain => {}
        }
    }

    pub fn last_error_fingerprint(&self) -> Option<&str> {
        self.last_error_fingerprint.as_deref()
    }
}

fn append_line(path: &Path, line: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file: File = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}

#[cfg(test)]
#[path = "child_io_tests.rs"]
mod tests;

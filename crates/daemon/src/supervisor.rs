// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor (spec §4.1): owns the child-process lifecycle. Spawns the
//! child, classifies its log output, and runs the restart decision tree on
//! every exit. The actual spawn loop (`run_once`) lives here too, but the
//! restart *decision* is exposed as a pure function of an `ExitContext` so
//! it can be exercised directly in tests without a real child process.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bosun_adapters::{ChildHandle, ChildProcessSpawner, ExitOutcome, TERMINATE_ESCALATION_DELAY};
use bosun_core::{Clock, Event};
use bosun_engine::{detached, DispatchOptions, EventDispatcher, RestartController};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::DaemonError;

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub script_path: PathBuf,
    pub script_args: Vec<String>,
    pub restart_delay_ms: i64,
    pub planner_grace_ms: i64,
    pub abnormal_exit_threshold: u32,
    pub abnormal_exit_window_ms: i64,
    pub halt_duration_ms: i64,
    pub max_restarts: Option<u32>,
    pub shutdown_hard_cap_ms: i64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            script_path: PathBuf::from("bosun-child"),
            script_args: Vec::new(),
            restart_delay_ms: 2_000,
            planner_grace_ms: 2 * 60 * 1000,
            abnormal_exit_threshold: 8,
            abnormal_exit_window_ms: 5 * 60 * 1000,
            halt_duration_ms: 10 * 60 * 1000,
            max_restarts: None,
            shutdown_hard_cap_ms: 5 * 60 * 1000,
        }
    }
}

/// Log-derived facts about one child run, gathered by scanning the lines
/// the Child I/O Pipeline classified during the run.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    pub had_error_markers: bool,
    pub had_normal_cycle_markers: bool,
    pub backlog_empty: bool,
    pub context_window_exhausted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartDecision {
    /// Shutdown already in progress; do nothing.
    NoneShuttingDown,
    /// A mutex-held quick exit; retry after this backoff, uncounted.
    BackoffRetry(i64),
    /// Restart after this delay (ms).
    RestartAfter(i64),
    /// Fired a planner trigger and will restart after the grace period.
    PlannerGraceThenRestart(i64),
    /// Abnormal-exit window tripped; halted until this timestamp (ms).
    Halted(i64),
    /// Still halted from a previous trip.
    StillHalted(i64),
    /// Max restart cap exceeded; stop for good.
    Stopped,
}

pub struct Supervisor<C: Clock> {
    clock: C,
    config: SupervisorConfig,
    restart_controller: Arc<RestartController<C>>,
    dispatcher: Arc<EventDispatcher<C>>,
    abnormal_exits: Mutex<VecDeque<i64>>,
    halted_until_ms: Mutex<Option<i64>>,
    restart_count: AtomicU32,
    restart_requested: AtomicBool,
    shutting_down: AtomicBool,
}

impl<C: Clock> Supervisor<C> {
    pub fn new(
        clock: C,
        config: SupervisorConfig,
        restart_controller: Arc<RestartController<C>>,
        dispatcher: Arc<EventDispatcher<C>>,
    ) -> Self {
        Self {
            clock,
            config,
            restart_controller,
            dispatcher,
            abnormal_exits: Mutex::new(VecDeque::new()),
            halted_until_ms: Mutex::new(None),
            restart_count: AtomicU32::new(0),
            restart_requested: AtomicBool::new(false),
            shutting_down: AtomicBool::new(false),
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Marks a shutdown in progress. `true` the first time; a second call
    /// (second SIGINT) returns `false`, which callers treat as "force".
    pub fn begin_shutdown(&self) -> bool {
        !self.shutting_down.swap(true, Ordering::SeqCst)
    }

    /// Requests that the next exit restart immediately, skipping autofix
    /// and exit analysis (spec §4.1 step 2).
    pub fn request_restart(&self) {
        self.restart_requested.store(true, Ordering::SeqCst);
    }

    /// The restart decision tree (spec §4.1 steps 1-9), run on every child
    /// exit. Pure aside from the internal counters/halt state this struct
    /// owns, so it can be driven directly with synthetic contexts in tests.
    pub fn handle_exit(&self, outcome: ExitOutcome, run_duration: Duration, log: &LogContext) -> RestartDecision {
        let now = self.clock.now_ms();

        // 1. Shutdown in progress.
        if self.is_shutting_down() {
            return RestartDecision::NoneShuttingDown;
        }

        // 2. Exit was requested via request_restart().
        if self.restart_requested.swap(false, Ordering::SeqCst) {
            return RestartDecision::RestartAfter(self.floor_restart_delay(self.config.restart_delay_ms));
        }

        // 3. Restart Controller: mutex-held quick exit gets uncounted backoff.
        let exit_state = self.restart_controller.record_exit(run_duration);
        if exit_state.mutex_held {
            return RestartDecision::BackoffRetry(self.floor_restart_delay(exit_state.backoff_ms));
        }

        // 4. SIGKILL: restart immediately, no further analysis.
        if outcome.signal == Some(9) {
            return RestartDecision::RestartAfter(self.floor_restart_delay(self.config.restart_delay_ms));
        }

        // 5. Benign code==1 with no error markers and normal cycle markers present.
        if outcome.code == Some(1) && !log.had_error_markers && log.had_normal_cycle_markers {
            return RestartDecision::RestartAfter(self.floor_restart_delay(self.config.restart_delay_ms));
        }

        // 6. Clean exit.
        if outcome.is_clean() {
            if log.backlog_empty {
                self.dispatcher.dispatch(
                    Event::BacklogEmpty,
                    DispatchOptions {
                        dedup_key: Some("planner-trigger".to_string()),
                        priority: None,
                        skip_dedup: false,
                    },
                );
                return RestartDecision::PlannerGraceThenRestart(self.floor_restart_delay(self.config.planner_grace_ms));
            }
            return RestartDecision::RestartAfter(self.floor_restart_delay(self.config.restart_delay_ms));
        }

        // Already in a crash-loop halt: further failure handling is silent
        // until resetAt, matching the Circuit Breaker's pause semantics.
        if let Some(until) = *self.halted_until_ms.lock() {
            if now < until {
                return RestartDecision::StillHalted(until);
            }
            *self.halted_until_ms.lock() = None;
        }

        // 7. Abnormal exit: background autofix/analysis, never blocks the
        // restart decision itself.
        let dispatcher = self.dispatcher.clone();
        let context_window_exhausted = log.context_window_exhausted;
        detached::<_, std::convert::Infallible>("post-exit-analysis", async move {
            if context_window_exhausted {
                dispatcher.dispatch(
                    Event::ContextWindowExhausted { attempt_id: None },
                    DispatchOptions::default(),
                );
            }
            Ok(())
        });

        // 8. Record the abnormal exit in the restart-window counter.
        let mut window = self.abnormal_exits.lock();
        window.push_back(now);
        while let Some(&oldest) = window.front() {
            if now - oldest > self.config.abnormal_exit_window_ms {
                window.pop_front();
            } else {
                break;
            }
        }
        if window.len() as u32 >= self.config.abnormal_exit_threshold {
            window.clear();
            let resume_at = now + self.config.halt_duration_ms;
            *self.halted_until_ms.lock() = Some(resume_at);
            warn!(resume_at, "crash-loop threshold reached; entering halt");
            return RestartDecision::Halted(resume_at);
        }
        drop(window);

        // 9. Max restart cap.
        let count = self.restart_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(max) = self.config.max_restarts {
            if count > max {
                return RestartDecision::Stopped;
            }
        }

        RestartDecision::RestartAfter(self.floor_restart_delay(self.config.restart_delay_ms))
    }

    /// Clamps a requested restart delay against the Restart Controller's
    /// "never spawn within 15s of the previous spawn" floor (spec §4.2).
    fn floor_restart_delay(&self, requested_ms: i64) -> i64 {
        let min_delay_ms = self.restart_controller.get_min_restart_delay().as_millis() as i64;
        requested_ms.max(min_delay_ms)
    }

    /// Spawns the child and runs it to completion, streaming stdout/stderr
    /// through `on_line`. Returns the process exit outcome and wall-clock
    /// run duration. Does not itself decide whether to restart.
    pub async fn run_once<S: ChildProcessSpawner>(
        &self,
        spawner: &S,
        mut on_line: impl FnMut(&str, bool),
    ) -> Result<(ExitOutcome, Duration), DaemonError> {
        let started = self.clock.now_ms();
        self.restart_controller.note_process_started();

        let args = self.config.script_args.clone();
        let mut handle = spawner
            .spawn(self.config.script_path.to_string_lossy().as_ref(), &args)
            .await?;

        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        loop {
            tokio::select! {
                chunk = handle.read_stdout_chunk() => {
                    match chunk? {
                        Some(bytes) => drain_lines(&mut stdout_buf, &bytes, false, &mut on_line),
                        None => {}
                    }
                }
                chunk = handle.read_stderr_chunk() => {
                    match chunk? {
                        Some(bytes) => drain_lines(&mut stderr_buf, &bytes, true, &mut on_line),
                        None => {}
                    }
                }
                outcome = handle.wait() => {
                    let outcome = outcome?;
                    let elapsed = Duration::from_millis((self.clock.now_ms() - started).max(0) as u64);
                    info!(?outcome, elapsed_ms = elapsed.as_millis() as i64, "child exited");
                    return Ok((outcome, elapsed));
                }
            }
        }
    }

    /// SIGTERM the child, escalating to SIGKILL after
    /// `TERMINATE_ESCALATION_DELAY` if it hasn't exited.
    pub async fn terminate_child(&self, handle: &mut dyn ChildHandle) -> Result<(), DaemonError> {
        handle.terminate().await?;
        tokio::select! {
            outcome = handle.wait() => {
                outcome?;
            }
            _ = tokio::time::sleep(TERMINATE_ESCALATION_DELAY) => {
                warn!("child did not exit within escalation delay; sending SIGKILL");
                handle.kill().await?;
            }
        }
        Ok(())
    }
}

fn drain_lines(buf: &mut Vec<u8>, chunk: &[u8], is_stderr: bool, on_line: &mut impl FnMut(&str, bool)) {
    buf.extend_from_slice(chunk);
    loop {
        let Some(pos) = buf.iter().position(|&b| b == b'\n') else {
            break;
        };
        let line_bytes: Vec<u8> = buf.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&line_bytes);
        on_line(line.trim_end_matches(['\n', '\r']), is_stderr);
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;

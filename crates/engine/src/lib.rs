// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Control-plane engine: the timer-driven components that keep a fleet of
//! AI coding agents moving without a human watching it. Owns restart
//! decisions, crash-loop protection, task/PR reconciliation, the event
//! fan-out pipeline, child stdout/stderr classification, source-change
//! watching, the secondary monitor-monitor loop, and notification routing.
//! `bosun-daemon` wires these together behind a process; `bosun-adapters`
//! supplies the external-system boundaries they call through.

mod child_io;
mod circuit_breaker;
mod detached;
mod dispatcher;
mod line_classifier;
mod listener_registry;
mod loop_detector;
mod notification_router;
mod reconciler;
mod restart_controller;
mod secondary_supervisor;
mod source_watcher;
mod state;

pub mod error;

pub use child_io::{ChildIoPipeline, ProcessedLine};
pub use circuit_breaker::{CircuitBreaker, TripOutcome};
pub use detached::{detached, detached_infallible};
pub use dispatcher::{classify_priority, normalize_dedup_key, DispatchOptions, EventDispatcher, Verbosity};
pub use error::EngineError;
pub use line_classifier::{classify, LineClass};
pub use listener_registry::{Listener, ListenerRegistry};
pub use loop_detector::LoopDetector;
pub use notification_router::{NotificationRouter, RoutedNotification, RoutingDecision};
pub use reconciler::{Reconciler, ReconcilerCaches, ReconcilerConfig, TaskOutcome};
pub use restart_controller::{ExitState, RestartController};
pub use secondary_supervisor::{SdkSlot, SecondarySupervisor, SecondarySupervisorConfig};
pub use source_watcher::{
    watch_source_dir, DeferOutcome, SourceWatcher, SourceWatcherConfig, DEFAULT_RETRY_INTERVAL,
};
pub use state::CoreState;

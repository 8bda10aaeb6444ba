// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener registry for the Event Dispatcher (spec §4.5, §9 "dynamic
//! listener fan-out"). Listeners subscribe by routing prefix (`task.`,
//! `pr.`, `agent.`, `digest.`, `anomaly.`) and are invoked in registration
//! order, each isolated from the others' failures — a panicking listener
//! never prevents the rest from running.

use bosun_core::Event;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

/// A subscriber to dispatched events. Implementations must be best-effort:
/// a returned `Err` is logged and never propagated.
pub trait Listener: Send + Sync {
    fn name(&self) -> &str;
    fn handle(&self, event: &Event, priority: u8);
}

struct Registration {
    prefix: &'static str,
    listener: Arc<dyn Listener>,
}

/// Holds the ordered set of listeners and fans events out to whichever
/// match the event's routing prefix.
#[derive(Default)]
pub struct ListenerRegistry {
    registrations: Vec<Registration>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spec §4.5's canonical ordering: Workflow Engine, Notifier, Autofix
    /// tracker, Planner triggers, Status-board updater. Callers register in
    /// that order to preserve it; this constructor doesn't enforce it but
    /// documents the expectation.
    pub fn register(&mut self, prefix: &'static str, listener: Arc<dyn Listener>) {
        self.registrations.push(Registration { prefix, listener });
    }

    /// Invoke every listener subscribed to `event`'s routing prefix, in
    /// registration order, isolating each from the others' panics.
    pub fn fan_out(&self, event: &Event, priority: u8) {
        let prefix = event.routing_prefix();
        for reg in &self.registrations {
            if reg.prefix != prefix {
                continue;
            }
            let listener = &reg.listener;
            let result = catch_unwind(AssertUnwindSafe(|| listener.handle(event, priority)));
            if let Err(panic) = result {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                error!(listener = reg.listener.name(), panic = %msg, "listener panicked; continuing fan-out");
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registrations.len()
    }
}

#[cfg(test)]
#[path = "listener_registry_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification Router (spec §4.10): takes a message/priority/category
//! triple already past the Event Dispatcher's dedup gate and decides
//! whether to suppress it, bridge it to a side channel, route it through
//! the Live Digest, or send it directly, appending every delivered message
//! to a bounded ring buffer used as autofix-prompt context.

use crate::dispatcher::Verbosity;
use parking_lot::Mutex;
use std::collections::VecDeque;

const RING_BUFFER_CAPACITY: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedNotification {
    pub message: String,
    pub priority: u8,
    pub bridged_side_channel: bool,
    pub routed_to_digest: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    Suppressed,
    Delivered,
}

pub struct NotificationRouter {
    verbosity: Verbosity,
    side_channel_enabled: bool,
    digest_available: bool,
    ring: Mutex<VecDeque<RoutedNotification>>,
}

impl NotificationRouter {
    pub fn new(verbosity: Verbosity, side_channel_enabled: bool, digest_available: bool) -> Self {
        Self {
            verbosity,
            side_channel_enabled,
            digest_available,
            ring: Mutex::new(VecDeque::with_capacity(RING_BUFFER_CAPACITY)),
        }
    }

    /// Route one message. Dedup is assumed to already have happened
    /// upstream in the Event Dispatcher; this trusts its inputs.
    pub fn route(&self, message: impl Into<String>, priority: u8) -> RoutingDecision {
        if priority > self.verbosity.max_priority() {
            return RoutingDecision::Suppressed;
        }

        let bridged = priority <= 2 && self.side_channel_enabled;
        let routed_to_digest = priority >= 3 && self.digest_available;

        let entry = RoutedNotification {
            message: message.into(),
            priority,
            bridged_side_channel: bridged,
            routed_to_digest,
        };
        let mut ring = self.ring.lock();
        if ring.len() == RING_BUFFER_CAPACITY {
            ring.pop_front();
        }
        ring.push_back(entry);
        RoutingDecision::Delivered
    }

    /// Most-recent-last snapshot of the ring buffer, for autofix context.
    pub fn recent(&self) -> Vec<RoutedNotification> {
        self.ring.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "notification_router_tests.rs"]
mod tests;

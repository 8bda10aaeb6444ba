// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `DigestEntry`: one line in the batched notification digest (spec §3, §4.10).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestEntry {
    pub time_ms: i64,
    pub emoji: String,
    pub text: String,
    /// 1 (critical) .. 5 (trace). See `priority::classify`.
    pub priority: u8,
    pub category: String,
}

impl DigestEntry {
    pub fn new(time_ms: i64, emoji: impl Into<String>, text: impl Into<String>, priority: u8, category: impl Into<String>) -> Self {
        Self {
            time_ms,
            emoji: emoji.into(),
            text: text.into(),
            priority: priority.clamp(1, 5),
            category: category.into(),
        }
    }
}

#[cfg(test)]
#[path = "digest_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic fingerprinting of error lines and dedup-key normalization
//! (spec §4.5, §4.8, GLOSSARY "Fingerprint").

use std::sync::LazyLock;

/// Strip volatile substrings (numeric ids, timestamps, trailing path tails)
/// from a raw message so that two occurrences of "the same" error collapse
/// to one dedup key. Mirrors the dispatcher's normalization step in spec
/// §4.5.
pub fn normalize(raw: &str) -> String {
    static NUMERIC_RUN: LazyLock<regex::Regex> = LazyLock::new(|| regex::Regex::new(r"\d+").unwrap());
    static ISO_TIMESTAMP: LazyLock<regex::Regex> = LazyLock::new(|| {
        regex::Regex::new(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?Z?").unwrap()
    });
    static PATH_TAIL: LazyLock<regex::Regex> =
        LazyLock::new(|| regex::Regex::new(r"[/\\][^/\\\s]+$").unwrap());

    let without_timestamps = ISO_TIMESTAMP.replace_all(raw, "<ts>");
    let without_path_tail = PATH_TAIL.replace(without_timestamps.trim(), "");
    let without_numbers = NUMERIC_RUN.replace_all(&without_path_tail, "#");
    without_numbers.trim().to_string()
}

/// Deterministic fingerprint of an error line: the normalized message. Kept
/// as its own function (rather than inlined at call sites) so the loop
/// detector and the dispatcher always agree on what counts as "the same"
/// error.
pub fn fingerprint(raw: &str) -> String {
    normalize(raw)
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;

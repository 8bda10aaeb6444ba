// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration (spec §6, §4.11): every persisted-state path plus
//! every recognized environment variable, parsed once into typed fields.
//! Unlike the teacher's user-level `~/.local/state/oj` daemon, this
//! supervisor is per-repo-root: every path lives under
//! `<repoRoot>/.bosun/.cache` (or `<repoRoot>/.cache` if that directory
//! already exists, matching the two layouts the spec names).

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::DaemonError;

#[derive(Debug, Clone)]
pub struct Config {
    pub repo_root: PathBuf,
    pub cache_dir: PathBuf,
    pub lock_path: PathBuf,
    pub self_restart_marker_path: PathBuf,
    pub log_path: PathBuf,
    pub merged_branch_cache_path: PathBuf,
    pub merged_task_id_cache_path: PathBuf,
    pub recovery_cache_path: PathBuf,
    pub epic_merge_cache_path: PathBuf,
    pub conflict_cooldown_cache_path: PathBuf,
    pub no_attempt_log_cache_path: PathBuf,
    pub monitor_monitor_status_gate_path: PathBuf,
    pub anomaly_signals_path: PathBuf,

    pub workflow: WorkflowConfig,
    pub self_restart: SelfRestartConfig,
    pub monitor_monitor: MonitorMonitorConfig,
    pub recovery: RecoveryConfig,
}

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub automation_enabled: bool,
    pub event_dedup_window_ms: i64,
}

#[derive(Debug, Clone)]
pub struct SelfRestartConfig {
    pub quiet_ms: i64,
    pub retry_ms: i64,
    pub defer_hard_cap: u32,
    pub max_defer_ms: i64,
    pub force_active_slot_min_age_ms: i64,
    pub watch_enabled: bool,
    pub watch_force: bool,
    pub allow_internal_runtime_restarts: bool,
}

#[derive(Debug, Clone)]
pub struct MonitorMonitorConfig {
    pub enabled: bool,
    pub interval_ms: i64,
    pub timeout_ms: i64,
    pub status_interval_ms: i64,
    pub branch: Option<String>,
    pub startup_delay_ms: i64,
    pub status_delay_ms: i64,
    pub skip_streak_threshold: u32,
}

#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    pub stale_task_age_ms: i64,
    pub cache_enabled: bool,
    pub log_dedup_minutes: i64,
    pub cache_max: usize,
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"))
        .unwrap_or(default)
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    pub fn load(repo_root: impl Into<PathBuf>) -> Result<Self, DaemonError> {
        let repo_root = repo_root.into();
        let cache_dir = resolve_cache_dir(&repo_root);

        Ok(Self {
            lock_path: cache_dir.join("monitor-lock"),
            self_restart_marker_path: cache_dir.join("self-restart.marker"),
            log_path: cache_dir.join("logs").join("bosun.log"),
            merged_branch_cache_path: cache_dir.join("merged-branch-cache.json"),
            merged_task_id_cache_path: cache_dir.join("merged-task-id-cache.json"),
            recovery_cache_path: cache_dir.join("task-recovery-cache.json"),
            epic_merge_cache_path: cache_dir.join("epic-merge-cache.json"),
            conflict_cooldown_cache_path: cache_dir.join("conflict-cooldown-cache.json"),
            no_attempt_log_cache_path: cache_dir.join("no-attempt-log-cache.json"),
            monitor_monitor_status_gate_path: cache_dir.join("monitor-monitor-startup-status-gate.json"),
            anomaly_signals_path: cache_dir.join("anomaly-signals.json"),
            cache_dir,
            repo_root,

            workflow: WorkflowConfig {
                automation_enabled: env_bool("WORKFLOW_AUTOMATION_ENABLED", true),
                event_dedup_window_ms: env_i64("WORKFLOW_EVENT_DEDUP_WINDOW_MS", 15_000),
            },
            self_restart: SelfRestartConfig {
                quiet_ms: env_i64("SELF_RESTART_QUIET_MS", 90_000),
                retry_ms: env_i64("SELF_RESTART_RETRY_MS", 30_000),
                defer_hard_cap: env_u32("SELF_RESTART_DEFER_HARD_CAP", 6),
                max_defer_ms: env_i64("SELF_RESTART_MAX_DEFER_MS", 3 * 60 * 1000),
                force_active_slot_min_age_ms: env_i64(
                    "SELF_RESTART_FORCE_ACTIVE_SLOT_MIN_AGE_MS",
                    3 * 60 * 1000,
                ),
                watch_enabled: env_bool("SELF_RESTART_WATCH_ENABLED", true),
                watch_force: env_bool("SELF_RESTART_WATCH_FORCE", false),
                allow_internal_runtime_restarts: env_bool("ALLOW_INTERNAL_RUNTIME_RESTARTS", true),
            },
            monitor_monitor: MonitorMonitorConfig {
                enabled: env_bool("DEVMODE_MONITOR_MONITOR_ENABLED", false),
                interval_ms: env_i64("DEVMODE_MONITOR_MONITOR_INTERVAL_MS", 5 * 60 * 1000),
                timeout_ms: env_i64("DEVMODE_MONITOR_MONITOR_TIMEOUT_MS", 2 * 60 * 1000),
                status_interval_ms: env_i64("DEVMODE_MONITOR_MONITOR_STATUS_INTERVAL_MS", 30 * 60 * 1000),
                branch: std::env::var("DEVMODE_MONITOR_MONITOR_BRANCH").ok(),
                startup_delay_ms: env_i64("DEVMODE_MONITOR_MONITOR_STARTUP_DELAY_MS", 15_000),
                status_delay_ms: env_i64("DEVMODE_MONITOR_MONITOR_STATUS_DELAY_MS", 20_000),
                skip_streak_threshold: env_u32("DEVMODE_MONITOR_MONITOR_SKIP_STREAK_THRESHOLD", 3),
            },
            recovery: RecoveryConfig {
                stale_task_age_ms: env_i64("STALE_TASK_AGE_HOURS", 3) * 60 * 60 * 1000,
                cache_enabled: env_bool("RECOVERY_CACHE_ENABLED", true),
                log_dedup_minutes: env_i64("RECOVERY_LOG_DEDUP_MINUTES", 30),
                cache_max: env_usize("RECOVERY_CACHE_MAX", 2_000),
            },
        })
    }
}

fn resolve_cache_dir(repo_root: &Path) -> PathBuf {
    let legacy = repo_root.join(".cache");
    if legacy.is_dir() {
        return legacy;
    }
    repo_root.join(".bosun").join(".cache")
}

/// The minimum interval between source-watcher retry evaluations, derived
/// from `SelfRestartConfig::retry_ms`, as a `Duration` for tokio timers.
pub fn retry_interval(config: &SelfRestartConfig) -> Duration {
    Duration::from_millis(config.retry_ms.max(0) as u64)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bosun Daemon (bosund)
//!
//! Background process that owns one child orchestrator's lifecycle for a
//! repo root: spawns it, classifies its output, runs the restart decision
//! tree on exit, and watches its own source tree for changes so it can
//! redeploy itself (spec §4.1, §4.7).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bosun_adapters::TokioChildProcessSpawner;
use bosun_core::SystemClock;
use bosun_daemon::config::Config;
use bosun_daemon::lock::{read_owner_pid, DaemonLock};
use bosun_daemon::preflight;
use bosun_daemon::supervisor::{LogContext, RestartDecision, Supervisor, SupervisorConfig};
use bosun_engine::{
    watch_source_dir, DeferOutcome, EventDispatcher, ListenerRegistry, RestartController,
    SourceWatcher, SourceWatcherConfig, Verbosity,
};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

struct Cli {
    script: PathBuf,
    args: Vec<String>,
    no_watch: bool,
    log_dir: Option<PathBuf>,
}

fn parse_args() -> Cli {
    let mut script = PathBuf::from("bosun-child");
    let mut args = Vec::new();
    let mut no_watch = false;
    let mut log_dir = None;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--script" => {
                if let Some(v) = it.next() {
                    script = PathBuf::from(v);
                }
            }
            "--args" => {
                args.extend(it.by_ref());
            }
            "--no-watch" => no_watch = true,
            "--no-codex" => {}
            "--log-dir" => {
                if let Some(v) = it.next() {
                    log_dir = Some(PathBuf::from(v));
                }
            }
            other => {
                eprintln!("bosund: unrecognized argument '{other}'");
            }
        }
    }

    Cli {
        script,
        args,
        no_watch,
        log_dir,
    }
}

#[tokio::main]
async fn main() {
    let cli = parse_args();
    let repo_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut config = match Config::load(&repo_root) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("bosund: failed to load config: {e}");
            std::process::exit(1);
        }
    };
    if let Some(dir) = &cli.log_dir {
        config.log_path = dir.join("bosun.log");
    }

    let _log_guard = match setup_logging(&config.log_path) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("bosund: failed to set up logging: {e}");
            std::process::exit(1);
        }
    };

    let _lock = match DaemonLock::acquire(&config.lock_path) {
        Ok(lock) => lock,
        Err(_) => {
            let owner = read_owner_pid(&config.lock_path);
            eprintln!("bosund is already running");
            if let Some(pid) = owner {
                eprintln!("  pid: {pid}");
            }
            // Duplicate start is a benign exit (spec §5, §7).
            std::process::exit(0);
        }
    };

    if let Err(e) = preflight::run(&cli.script) {
        error!(error = %e, "preflight failed; not spawning");
        eprintln!("bosund: preflight failed: {e}");
        std::process::exit(1);
    }

    let clock = SystemClock;
    let restart_controller = Arc::new(RestartController::new(clock));
    let dispatcher = Arc::new(EventDispatcher::new(clock, Verbosity::Detailed, ListenerRegistry::new()));

    let supervisor_config = SupervisorConfig {
        script_path: cli.script.clone(),
        script_args: cli.args.clone(),
        ..SupervisorConfig::default()
    };
    let supervisor = Arc::new(Supervisor::new(clock, supervisor_config, restart_controller, dispatcher));
    let spawner = TokioChildProcessSpawner;

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGTERM handler");
            std::process::exit(1);
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGINT handler");
            std::process::exit(1);
        }
    };

    let _fs_watcher = if cli.no_watch || !config.self_restart.watch_enabled {
        None
    } else {
        info!("source watcher enabled; self-restart on source change");
        let watcher_config = SourceWatcherConfig {
            quiet_ms: config.self_restart.quiet_ms,
            retry_ms: config.self_restart.retry_ms,
            defer_hard_cap: config.self_restart.defer_hard_cap,
            max_defer_ms: config.self_restart.max_defer_ms,
            force_active_slot_min_age_ms: config.self_restart.force_active_slot_min_age_ms,
        };
        let retry_interval = bosun_daemon::config::retry_interval(&config.self_restart);
        let watcher = Arc::new(SourceWatcher::new(clock, watcher_config));
        let watcher_for_fs = watcher.clone();
        let fs_watcher = watch_source_dir(&repo_root, move || watcher_for_fs.note_change());
        match fs_watcher {
            Ok(handle) => {
                spawn_source_watch_loop(watcher, supervisor.clone(), retry_interval);
                Some(handle)
            }
            Err(e) => {
                error!(error = %e, "failed to start source watcher; continuing without it");
                None
            }
        }
    };

    println!("READY");
    info!("bosund ready, pid={}", std::process::id());

    loop {
        tokio::select! {
            result = supervisor.run_once(&spawner, |line, is_stderr| {
                if is_stderr {
                    info!(target: "child.stderr", "{line}");
                } else {
                    info!(target: "child.stdout", "{line}");
                }
            }) => {
                match result {
                    Ok((outcome, duration)) => {
                        let decision = supervisor.handle_exit(outcome, duration, &LogContext::default());
                        if !apply_decision(&supervisor, decision).await {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "failed to run child");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                graceful_shutdown(&supervisor).await;
                break;
            }
            _ = sigint.recv() => {
                if !supervisor.begin_shutdown() {
                    info!("received second SIGINT, forcing exit");
                    std::process::exit(130);
                }
                info!("received SIGINT, shutting down");
                graceful_shutdown(&supervisor).await;
                break;
            }
        }
    }
}

/// Acts on a restart decision. Returns `false` when the loop should stop.
async fn apply_decision<C: bosun_core::Clock>(_supervisor: &Supervisor<C>, decision: RestartDecision) -> bool {
    match decision {
        RestartDecision::NoneShuttingDown | RestartDecision::Stopped => false,
        RestartDecision::RestartAfter(ms)
        | RestartDecision::BackoffRetry(ms)
        | RestartDecision::PlannerGraceThenRestart(ms) => {
            tokio::time::sleep(Duration::from_millis(ms.max(0) as u64)).await;
            true
        }
        RestartDecision::Halted(resume_at) | RestartDecision::StillHalted(resume_at) => {
            let now = SystemClock.now_ms();
            let wait_ms = (resume_at - now).max(0) as u64;
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
            true
        }
    }
}

/// Polls the source watcher on its retry interval and flags the supervisor
/// for restart once it decides the quiet period has elapsed (spec §4.7).
/// The daemon itself tracks no sub-agent ages, so a pending change always
/// evaluates against an empty active-agent set.
fn spawn_source_watch_loop<C: bosun_core::Clock>(
    watcher: Arc<SourceWatcher<C>>,
    supervisor: Arc<Supervisor<C>>,
    retry_interval: Duration,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(retry_interval.max(Duration::from_millis(1)));
        loop {
            ticker.tick().await;
            if !watcher.has_pending_change() {
                continue;
            }
            if let DeferOutcome::ForceRestart { .. } = watcher.evaluate(&[]) {
                info!("source change quiet period elapsed; requesting restart");
                supervisor.request_restart();
            }
        }
    });
}

async fn graceful_shutdown<C: bosun_core::Clock>(supervisor: &Supervisor<C>) {
    supervisor.begin_shutdown();
}

fn setup_logging(
    log_path: &std::path::Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = log_path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "log path has no file name")
    })?;
    let dir = log_path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "log path has no parent")
    })?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

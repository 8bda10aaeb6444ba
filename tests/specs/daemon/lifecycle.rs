//! Daemon lifecycle specs: lock contention, preflight, graceful shutdown.

use crate::prelude::*;

#[test]
fn preflight_failure_exits_nonzero_without_spawning() {
    let project = Project::empty();
    let missing_script = project.path().join("does-not-exist.sh");

    let output = project.run(&missing_script, &[]);

    assert!(!output.status.success(), "bosund should fail preflight and exit nonzero");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("preflight failed"), "stderr was: {stderr}");
}

#[test]
fn duplicate_start_is_benign_and_does_not_disturb_the_running_instance() {
    let project = Project::empty();
    let script = project.script("child.sh", "sleep 30");

    let first = project.spawn(&script, &["--no-watch"]);
    assert!(first.pid() > 0);

    let second = project.run(&script, &["--no-watch"]);
    assert!(second.status.success(), "duplicate start is a benign exit, not an error");
    let stderr = String::from_utf8_lossy(&second.stderr);
    assert!(stderr.contains("already running"), "stderr was: {stderr}");

    assert!(process_exists(first.pid()), "the original instance must survive a duplicate start");
    first.terminate_and_wait();
}

#[test]
fn sigterm_triggers_graceful_shutdown() {
    let project = Project::empty();
    let script = project.script("child.sh", "sleep 30");

    let proc = project.spawn(&script, &["--no-watch"]);
    proc.terminate_and_wait();
}

#[test]
fn starting_again_after_clean_shutdown_succeeds() {
    let project = Project::empty();
    let script = project.script("child.sh", "sleep 30");

    let first = project.spawn(&script, &["--no-watch"]);
    first.terminate_and_wait();

    let second = project.spawn(&script, &["--no-watch"]);
    second.terminate_and_wait();
}

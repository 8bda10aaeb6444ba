//! Restart-decision specs driven through the real process, not the unit
//! tree: a cleanly-exiting child should be relaunched repeatedly rather than
//! leaving the supervisor idle.

use crate::prelude::*;

#[test]
fn clean_exit_child_gets_restarted_by_the_supervisor() {
    let project = Project::empty();
    // Exits clean immediately, over and over; the default restart delay is
    // 2s so two iterations easily fit the spec wait budget.
    let script = project.script("child.sh", "exit 0");

    let proc = project.spawn(&script, &["--no-watch"]);

    let restarted_twice = wait_for(SPEC_WAIT_MAX_MS * 2, || {
        project.log_contents().matches("child exited").count() >= 2
    });
    assert!(
        restarted_twice,
        "expected at least two restart cycles in the log, got:\n{}",
        project.log_contents()
    );

    proc.terminate_and_wait();
}

use super::*;
use bosun_core::FakeClock;

#[test]
fn quick_exit_without_mutex_leaves_backoff_unchanged() {
    let clock = FakeClock::at(0);
    let ctrl = RestartController::new(clock);
    ctrl.note_process_started();
    let outcome = ctrl.record_exit(Duration::from_millis(5_000));
    assert!(outcome.was_quick_exit);
    assert!(!outcome.mutex_held);
    assert_eq!(outcome.backoff_ms, BASE_MUTEX_BACKOFF_MS);
}

#[test]
fn quick_exit_with_mutex_doubles_backoff_and_caps() {
    let clock = FakeClock::at(0);
    let ctrl = RestartController::new(clock);
    ctrl.note_process_started();
    ctrl.note_log_line("Another orchestrator instance is already running");
    let first = ctrl.record_exit(Duration::from_millis(1_000));
    assert!(first.mutex_held);
    assert_eq!(first.backoff_ms, BASE_MUTEX_BACKOFF_MS * 2);

    for _ in 0..10 {
        ctrl.note_log_line("Another orchestrator instance is already running");
        ctrl.record_exit(Duration::from_millis(1_000));
    }
    assert_eq!(ctrl.record_exit(Duration::from_millis(1_000)).backoff_ms, MAX_MUTEX_BACKOFF_MS);
}

#[test]
fn long_run_resets_backoff_to_base() {
    let clock = FakeClock::at(0);
    let ctrl = RestartController::new(clock);
    ctrl.note_process_started();
    ctrl.note_log_line("Another orchestrator instance is already running");
    ctrl.record_exit(Duration::from_millis(1_000));
    let after_long_run = ctrl.record_exit(Duration::from_millis(25_000));
    assert!(!after_long_run.was_quick_exit);
    assert_eq!(after_long_run.backoff_ms, BASE_MUTEX_BACKOFF_MS);
}

#[test]
fn min_restart_delay_counts_down_from_fifteen_seconds() {
    let clock = FakeClock::at(0);
    let ctrl = RestartController::new(clock.clone());
    ctrl.note_process_started();
    clock.advance(Duration::from_millis(10_000));
    assert_eq!(ctrl.get_min_restart_delay(), Duration::from_millis(5_000));
    clock.advance(Duration::from_millis(10_000));
    assert_eq!(ctrl.get_min_restart_delay(), Duration::ZERO);
}

#[test]
fn suppresses_file_change_restart_only_while_mutex_backoff_outstanding() {
    let clock = FakeClock::at(0);
    let ctrl = RestartController::new(clock);
    ctrl.note_process_started();
    assert!(!ctrl.should_suppress_restart("file-change"));
    ctrl.note_log_line("Another orchestrator instance is already running");
    ctrl.record_exit(Duration::from_millis(1_000));
    assert!(ctrl.should_suppress_restart("file-change"));
    assert!(!ctrl.should_suppress_restart("autofix"));
}

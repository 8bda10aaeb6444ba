use super::*;
use crate::dispatcher::Verbosity;
use crate::listener_registry::ListenerRegistry;
use bosun_core::FakeClock;
use tempfile::tempdir;

fn pipeline(dir: &std::path::Path) -> ChildIoPipeline<FakeClock> {
    let clock = FakeClock::at(1000);
    let dispatcher = Arc::new(EventDispatcher::new(
        clock.clone(),
        Verbosity::Detailed,
        ListenerRegistry::new(),
    ));
    let loop_detector = Arc::new(LoopDetector::new(clock.clone()));
    let restart_controller = Arc::new(RestartController::new(clock.clone()));
    ChildIoPipeline::new(
        clock,
        dispatcher,
        loop_detector,
        restart_controller,
        dir.join("active.log"),
        dir.join("attempts"),
    )
}

#[test]
fn splits_chunk_across_multiple_lines() {
    let dir = tempdir().unwrap();
    let mut pipe = pipeline(dir.path());
    let processed = pipe.ingest_chunk(b"line one\nline two\npartial").unwrap();
    assert_eq!(processed.len(), 2);
    assert_eq!(processed[0].raw, "line one");
    assert_eq!(processed[1].raw, "line two");
}

#[test]
fn reassembles_line_split_across_chunks() {
    let dir = tempdir().unwrap();
    let mut pipe = pipeline(dir.path());
    assert!(pipe.ingest_chunk(b"Merged PR #").unwrap().is_empty());
    let processed = pipe.ingest_chunk(b"42\n").unwrap();
    assert_eq!(processed.len(), 1);
    assert_eq!(processed[0].class, LineClass::MergedPr { pr_number: 42 });
}

#[test]
fn flush_remainder_emits_trailing_partial_line() {
    let dir = tempdir().unwrap();
    let mut pipe = pipeline(dir.path());
    pipe.ingest_chunk(b"no trailing newline").unwrap();
    let flushed = pipe.flush_remainder().unwrap().unwrap();
    assert_eq!(flushed.raw, "no trailing newline");
    assert!(pipe.flush_remainder().unwrap().is_none());
}

#[test]
fn tees_attempt_lines_to_per_attempt_log() {
    let dir = tempdir().unwrap();
    let mut pipe = pipeline(dir.path());
    pipe.ingest_chunk(b"[abc123] doing work\n").unwrap();
    let attempt_log = dir.path().join("attempts").join("abc123.log");
    assert!(attempt_log.exists());
    let contents = std::fs::read_to_string(attempt_log).unwrap();
    assert!(contents.contains("doing work"));
}

#[test]
fn active_log_receives_every_line() {
    let dir = tempdir().unwrap();
    let mut pipe = pipeline(dir.path());
    pipe.ingest_chunk(b"hello\nworld\n").unwrap();
    let contents = std::fs::read_to_string(dir.path().join("active.log")).unwrap();
    assert!(contents.contains("hello"));
    assert!(contents.contains("world"));
}

#[test]
fn error_line_updates_last_error_fingerprint() {
    let dir = tempdir().unwrap();
    let mut pipe = pipeline(dir.path());
    pipe.ingest_chunk(b"Error: connection refused\n").unwrap();
    assert!(pipe.last_error_fingerprint().is_some());
}

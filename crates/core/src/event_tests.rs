use super::*;

#[test]
fn routing_prefix_groups_task_events() {
    let ev = Event::TaskRecovered {
        task_id: TaskId::new("t1"),
    };
    assert_eq!(ev.routing_prefix(), "task.");
}

#[test]
fn routing_prefix_groups_pr_events() {
    let ev = Event::PrMerged {
        task_id: TaskId::new("t1"),
        pr_number: 42,
        branch: "ve/t1-feat".into(),
    };
    assert_eq!(ev.routing_prefix(), "pr.");
}

#[test]
fn default_message_matches_spec_markers() {
    assert_eq!(Event::BacklogEmpty.default_message(), "ALL TASKS COMPLETE");
    assert_eq!(
        Event::MergedPrMarker { pr_number: 7 }.default_message(),
        "Merged PR #7"
    );
    assert_eq!(
        Event::AttemptFinished {
            short_id: "abc123".into(),
            completed: true
        }
        .default_message(),
        "Attempt abc123 finished (completed)"
    );
}

#[test]
fn serde_tagged_round_trip() {
    let ev = Event::PrOpened {
        task_id: TaskId::new("t1"),
        pr_number: 9,
        branch: "ve/t1-x".into(),
    };
    let json = serde_json::to_string(&ev).unwrap();
    assert!(json.contains("\"type\":\"pr_opened\""));
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ev);
}

#[test]
fn anomaly_signal_round_trips() {
    let sig = AnomalySignal {
        kind: "crash_loop".into(),
        severity: AnomalySeverity::Critical,
        action: "halted".into(),
        short_id: Some("abc1".into()),
        process_id: Some(1234),
        message: "8 exits in 5 minutes".into(),
        timestamp: 1_700_000_000_000,
    };
    let json = serde_json::to_string(&sig).unwrap();
    let back: AnomalySignal = serde_json::from_str(&json).unwrap();
    assert_eq!(back, sig);
}

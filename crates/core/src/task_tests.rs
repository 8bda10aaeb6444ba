use super::*;

fn task_with(status: TaskStatus, updated_at_ms: i64) -> Task {
    Task {
        id: TaskId::new("t1"),
        title: "do the thing".into(),
        status,
        branch: None,
        base_branch: None,
        pr_number: None,
        updated_at_ms,
        description: None,
        labels: vec![],
        meta: Default::default(),
    }
}

#[test]
fn done_and_cancelled_are_terminal() {
    assert!(TaskStatus::Done.is_terminal());
    assert!(TaskStatus::Cancelled.is_terminal());
    assert!(!TaskStatus::Todo.is_terminal());
    assert!(!TaskStatus::InProgress.is_terminal());
    assert!(!TaskStatus::InReview.is_terminal());
}

#[test]
fn age_ms_is_nonnegative_even_with_clock_drift() {
    let task = task_with(TaskStatus::InProgress, 10_000);
    assert_eq!(task.age_ms(15_000), 5_000);
    assert_eq!(task.age_ms(5_000), 0);
}

#[test]
fn serde_round_trip_preserves_status() {
    let task = task_with(TaskStatus::InReview, 1);
    let json = serde_json::to_string(&task).unwrap();
    let back: Task = serde_json::from_str(&json).unwrap();
    assert_eq!(back.status, TaskStatus::InReview);
}

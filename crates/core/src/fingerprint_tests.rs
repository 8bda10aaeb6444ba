use super::*;

#[test]
fn normalize_strips_numeric_ids() {
    let a = normalize("rebase conflict on task abc123-42");
    let b = normalize("rebase conflict on task abc456-99");
    assert_eq!(a, b);
}

#[test]
fn normalize_strips_iso_timestamps() {
    let a = normalize("error at 2026-07-31T12:00:00Z connecting");
    let b = normalize("error at 2026-07-31T12:05:31.123Z connecting");
    assert_eq!(a, b);
}

#[test]
fn normalize_strips_trailing_path_tail() {
    let a = normalize("failed to read /repo/worktrees/task-1.lock");
    let b = normalize("failed to read /repo/worktrees/task-2.lock");
    assert_eq!(a, b);
}

#[test]
fn fingerprint_is_stable_for_identical_input() {
    assert_eq!(fingerprint("same message"), fingerprint("same message"));
}

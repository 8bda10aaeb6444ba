use super::*;

#[test]
fn acquire_writes_own_pid() {
    let dir = tempfile::tempdir().expect("tempdir");
    let lock_path = dir.path().join("monitor-lock");
    let lock = DaemonLock::acquire(&lock_path).expect("acquire");
    drop(lock);

    let pid = read_owner_pid(&lock_path).expect("pid");
    assert_eq!(pid, std::process::id());
}

#[test]
fn second_acquire_fails_while_first_is_held() {
    let dir = tempfile::tempdir().expect("tempdir");
    let lock_path = dir.path().join("monitor-lock");
    let _first = DaemonLock::acquire(&lock_path).expect("first acquire");

    let second = DaemonLock::acquire(&lock_path);
    assert!(matches!(second, Err(DaemonError::LockFailed(_))));
}

#[test]
fn lock_is_released_on_drop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let lock_path = dir.path().join("monitor-lock");
    {
        let _first = DaemonLock::acquire(&lock_path).expect("first acquire");
    }
    let second = DaemonLock::acquire(&lock_path);
    assert!(second.is_ok());
}

#[test]
fn read_owner_pid_is_none_for_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let lock_path = dir.path().join("missing-lock");
    assert_eq!(read_owner_pid(&lock_path), None);
}

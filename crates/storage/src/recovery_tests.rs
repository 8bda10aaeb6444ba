use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn strikes_increment_across_sweeps() {
    let dir = tempdir().unwrap();
    let cache = RecoveryCache::load(dir.path().join("c.json"));
    assert_eq!(cache.record_strike("t1", 5, 0), 1);
    assert_eq!(cache.record_strike("t1", 5, 100), 2);
    assert_eq!(cache.record_strike("t1", 5, 200), 3);
}

#[tokio::test]
async fn strikes_reset_on_task_version_change() {
    let dir = tempdir().unwrap();
    let cache = RecoveryCache::load(dir.path().join("c.json"));
    cache.record_strike("t1", 5, 0);
    cache.record_strike("t1", 5, 100);
    // task updated -> version bump -> strike history invisible
    assert_eq!(cache.get("t1", 6, 200), None);
    assert_eq!(cache.record_strike("t1", 6, 200), 1);
}

#[tokio::test]
async fn skip_disposition_round_trips() {
    let dir = tempdir().unwrap();
    let cache = RecoveryCache::load(dir.path().join("c.json"));
    cache.record_skip("t1", ResolvedStatus::Done, 5, 0);
    let state = cache.get("t1", 5, 10).unwrap();
    assert_eq!(state.resolved_status, Some(ResolvedStatus::Done));
    assert_eq!(state.strikes, 0);
}

#[tokio::test]
async fn skip_disposition_evicted_after_ttl() {
    let dir = tempdir().unwrap();
    let cache = RecoveryCache::load(dir.path().join("c.json"));
    cache.record_skip("t1", ResolvedStatus::FetchFailed, 5, 0);
    assert_eq!(cache.get("t1", 5, 30 * 60 * 1000 + 1), None);
}

#[tokio::test]
async fn clear_drops_entry() {
    let dir = tempdir().unwrap();
    let cache = RecoveryCache::load(dir.path().join("c.json"));
    cache.record_strike("t1", 5, 0);
    assert_eq!(cache.len(), 1);
    cache.clear("t1");
    assert!(cache.is_empty());
}

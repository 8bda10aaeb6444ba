use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn set_then_get_round_trips() {
    let dir = tempdir().unwrap();
    let cache = EpicMergeCache::load(dir.path().join("c.json"));
    assert_eq!(cache.get("ve/child", "ve/parent"), None);
    cache.set("ve/child", "ve/parent", EpicMergeStatus::Pending, 0);
    assert_eq!(cache.get("ve/child", "ve/parent"), Some(EpicMergeStatus::Pending));
}

#[tokio::test]
async fn status_change_overwrites_entry() {
    let dir = tempdir().unwrap();
    let cache = EpicMergeCache::load(dir.path().join("c.json"));
    cache.set("ve/child", "ve/parent", EpicMergeStatus::Pending, 0);
    cache.set("ve/child", "ve/parent", EpicMergeStatus::Merged, 100);
    assert_eq!(cache.get("ve/child", "ve/parent"), Some(EpicMergeStatus::Merged));
}

#[tokio::test]
async fn distinct_pairs_are_independent() {
    let dir = tempdir().unwrap();
    let cache = EpicMergeCache::load(dir.path().join("c.json"));
    cache.set("ve/a", "ve/base", EpicMergeStatus::Merged, 0);
    cache.set("ve/b", "ve/base", EpicMergeStatus::Conflicted, 0);
    assert_eq!(cache.get("ve/a", "ve/base"), Some(EpicMergeStatus::Merged));
    assert_eq!(cache.get("ve/b", "ve/base"), Some(EpicMergeStatus::Conflicted));
}

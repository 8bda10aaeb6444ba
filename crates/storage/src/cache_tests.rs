use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn insert_then_get_round_trips_in_memory() {
    let dir = tempdir().unwrap();
    let cache: PersistentCache<String> = PersistentCache::load(dir.path().join("c.json"));
    cache.insert("k1".into(), "v1".into());
    assert_eq!(cache.get("k1"), Some("v1".to_string()));
}

#[tokio::test]
async fn save_now_then_load_round_trips_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("c.json");
    let cache: PersistentCache<String> = PersistentCache::load(&path);
    cache.insert("k1".into(), "v1".into());
    cache.save_now().unwrap();

    let reloaded: PersistentCache<String> = PersistentCache::load(&path);
    assert_eq!(reloaded.get("k1"), Some("v1".to_string()));
}

#[tokio::test]
async fn overflow_evicts_oldest_inserted_entry() {
    let dir = tempdir().unwrap();
    let cache: PersistentCache<i32> = PersistentCache::load(dir.path().join("c.json")).with_max_size(2);
    cache.insert("a".into(), 1);
    cache.insert("b".into(), 2);
    cache.insert("c".into(), 3);
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("a"), None, "oldest entry should be evicted");
    assert_eq!(cache.get("b"), Some(2));
    assert_eq!(cache.get("c"), Some(3));
}

#[tokio::test]
async fn corrupt_file_is_quarantined_and_load_falls_back_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("c.json");
    std::fs::write(&path, b"not json at all").unwrap();

    let cache: PersistentCache<String> = PersistentCache::load(&path);
    assert!(cache.is_empty());

    let quarantined: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| n.contains(".corrupt-"))
        })
        .collect();
    assert_eq!(quarantined.len(), 1);
}

#[tokio::test]
async fn remove_drops_entry() {
    let dir = tempdir().unwrap();
    let cache: PersistentCache<i32> = PersistentCache::load(dir.path().join("c.json"));
    cache.insert("k".into(), 1);
    assert_eq!(cache.remove("k"), Some(1));
    assert_eq!(cache.get("k"), None);
}

#[tokio::test]
async fn retain_drops_entries_failing_predicate() {
    let dir = tempdir().unwrap();
    let cache: PersistentCache<i32> = PersistentCache::load(dir.path().join("c.json"));
    cache.insert("a".into(), 1);
    cache.insert("b".into(), 2);
    cache.retain(|_, v| *v > 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("b"), Some(2));
}

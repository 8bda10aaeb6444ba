use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn entry_valid_while_version_and_ttl_hold() {
    let dir = tempdir().unwrap();
    let cache: TtlVersionedCache<u32> = TtlVersionedCache::load(dir.path().join("c.json"), 10, 1_800_000);
    cache.set("t1", 2, 100, 0);
    assert_eq!(cache.get_valid("t1", 100, 10_000), Some(2));
}

#[tokio::test]
async fn entry_evicted_on_version_mismatch() {
    let dir = tempdir().unwrap();
    let cache: TtlVersionedCache<u32> = TtlVersionedCache::load(dir.path().join("c.json"), 10, 1_800_000);
    cache.set("t1", 2, 100, 0);
    assert_eq!(cache.get_valid("t1", 200, 10), None);
    assert!(cache.get_valid("t1", 100, 10).is_none(), "evicted, so even the original version misses now");
}

#[tokio::test]
async fn entry_evicted_after_ttl_elapses() {
    let dir = tempdir().unwrap();
    let ttl_ms = 1_800_000;
    let cache: TtlVersionedCache<u32> = TtlVersionedCache::load(dir.path().join("c.json"), 10, ttl_ms);
    cache.set("t1", 2, 100, 0);
    assert_eq!(cache.get_valid("t1", 100, ttl_ms + 1), None);
}

#[tokio::test]
async fn entry_valid_at_exact_ttl_boundary() {
    let dir = tempdir().unwrap();
    let ttl_ms = 1_800_000;
    let cache: TtlVersionedCache<u32> = TtlVersionedCache::load(dir.path().join("c.json"), 10, ttl_ms);
    cache.set("t1", 2, 100, 0);
    assert_eq!(cache.get_valid("t1", 100, ttl_ms), Some(2));
}

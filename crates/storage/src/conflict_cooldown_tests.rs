use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn first_conflict_starts_cooldown() {
    let dir = tempdir().unwrap();
    let cache = ConflictCooldownCache::load(dir.path().join("c.json"));
    assert!(!cache.in_cooldown("T1", 5, 0));
    let attempts = cache.record_conflict("T1", 5, 60_000, 0);
    assert_eq!(attempts, 1);
    assert!(cache.in_cooldown("T1", 5, 30_000));
}

#[tokio::test]
async fn cooldown_expires_after_window() {
    let dir = tempdir().unwrap();
    let cache = ConflictCooldownCache::load(dir.path().join("c.json"));
    cache.record_conflict("T1", 5, 60_000, 0);
    assert!(!cache.in_cooldown("T1", 5, 60_001));
}

#[tokio::test]
async fn repeated_conflicts_increment_attempts() {
    let dir = tempdir().unwrap();
    let cache = ConflictCooldownCache::load(dir.path().join("c.json"));
    cache.record_conflict("T1", 5, 60_000, 0);
    let attempts = cache.record_conflict("T1", 5, 60_000, 61_000);
    assert_eq!(attempts, 2);
}

#[tokio::test]
async fn resolution_clears_cooldown() {
    let dir = tempdir().unwrap();
    let cache = ConflictCooldownCache::load(dir.path().join("c.json"));
    cache.record_conflict("T1", 5, 60_000, 0);
    cache.resolved("T1");
    assert!(!cache.in_cooldown("T1", 5, 0));
}

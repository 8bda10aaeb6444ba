use super::*;
use serial_test::serial;

fn clear_env() {
    for key in [
        "STALE_TASK_AGE_HOURS",
        "SELF_RESTART_QUIET_MS",
        "RECOVERY_CACHE_ENABLED",
        "DEVMODE_MONITOR_MONITOR_ENABLED",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn defaults_match_spec_values_when_unset() {
    clear_env();
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::load(dir.path()).expect("load");

    assert_eq!(config.self_restart.quiet_ms, 90_000);
    assert_eq!(config.self_restart.defer_hard_cap, 6);
    assert_eq!(config.recovery.stale_task_age_ms, 3 * 60 * 60 * 1000);
    assert!(config.recovery.cache_enabled);
    assert!(!config.monitor_monitor.enabled);
}

#[test]
#[serial]
fn env_overrides_are_applied() {
    clear_env();
    std::env::set_var("STALE_TASK_AGE_HOURS", "6");
    std::env::set_var("SELF_RESTART_QUIET_MS", "5000");
    std::env::set_var("RECOVERY_CACHE_ENABLED", "0");

    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::load(dir.path()).expect("load");

    assert_eq!(config.recovery.stale_task_age_ms, 6 * 60 * 60 * 1000);
    assert_eq!(config.self_restart.quiet_ms, 5_000);
    assert!(!config.recovery.cache_enabled);

    clear_env();
}

#[test]
#[serial]
fn cache_dir_prefers_legacy_dot_cache_when_present() {
    clear_env();
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join(".cache")).expect("mkdir");

    let config = Config::load(dir.path()).expect("load");
    assert_eq!(config.cache_dir, dir.path().join(".cache"));
}

#[test]
#[serial]
fn cache_dir_falls_back_to_bosun_cache_layout() {
    clear_env();
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::load(dir.path()).expect("load");
    assert_eq!(config.cache_dir, dir.path().join(".bosun").join(".cache"));
}

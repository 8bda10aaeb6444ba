use super::*;
use serial_test::serial;

#[test]
#[serial]
fn explicit_override_wins() {
    std::env::set_var("BOSUN_DAEMON_BINARY", "/opt/bosund-custom");
    let path = find_bosund_binary();
    assert_eq!(path, PathBuf::from("/opt/bosund-custom"));
    std::env::remove_var("BOSUN_DAEMON_BINARY");
}

#[test]
#[serial]
fn falls_back_to_bare_name_when_nothing_else_resolves() {
    std::env::remove_var("BOSUN_DAEMON_BINARY");
    std::env::remove_var("CARGO_MANIFEST_DIR");
    let path = find_bosund_binary();
    assert!(path == PathBuf::from("bosund") || path.ends_with("bosund"));
}

use super::*;

#[yare::parameterized(
    five_seconds  = { 5_000,          "5s" },
    two_minutes   = { 125_000,        "2m" },
    two_hours     = { 7_300_000,      "2h" },
    two_days      = { 2 * 86_400_000, "2d" },
    negative_ms   = { -100,           "0s" },
)]
fn elapsed_ms(ms: i64, expected: &str) {
    assert_eq!(format_elapsed_ms(ms), expected);
}

#[test]
fn elapsed_duration_delegates_to_millis() {
    assert_eq!(format_elapsed(std::time::Duration::from_secs(125)), "2m");
}

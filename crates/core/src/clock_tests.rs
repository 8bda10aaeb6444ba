use super::*;

#[test]
fn fake_clock_starts_at_given_time() {
    let clock = FakeClock::at(1_000);
    assert_eq!(clock.now_ms(), 1_000);
}

#[test]
fn fake_clock_advances_monotonically() {
    let clock = FakeClock::at(0);
    clock.advance(Duration::from_secs(5));
    assert_eq!(clock.now_ms(), 5_000);
    clock.advance(Duration::from_millis(250));
    assert_eq!(clock.now_ms(), 5_250);
}

#[test]
fn fake_clock_clones_share_state() {
    let clock = FakeClock::at(0);
    let clone = clock.clone();
    clock.advance(Duration::from_secs(1));
    assert_eq!(clone.now_ms(), 1_000);
}

#[test]
fn system_clock_now_ms_is_plausible() {
    let clock = SystemClock;
    // Should be a large positive number (after 2020-ish) and not panic.
    assert!(clock.now_ms() > 1_600_000_000_000);
}

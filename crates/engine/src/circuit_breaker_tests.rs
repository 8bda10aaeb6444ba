use super::*;
use bosun_core::FakeClock;

#[test]
fn trips_after_five_failures_in_window() {
    let clock = FakeClock::at(0);
    let breaker = CircuitBreaker::new(clock.clone());
    for _ in 0..4 {
        let outcome = breaker.record_event();
        assert!(!outcome.just_tripped);
    }
    let outcome = breaker.record_event();
    assert_eq!(outcome.count, 5);
    assert!(outcome.just_tripped);
    assert!(breaker.is_tripped());
}

#[test]
fn old_failures_fall_out_of_window() {
    let clock = FakeClock::at(0);
    let breaker = CircuitBreaker::new(clock.clone());
    breaker.record_event();
    breaker.record_event();
    clock.advance(std::time::Duration::from_millis(61_000));
    // the first two failures are outside the window now
    let outcome = breaker.record_event();
    assert_eq!(outcome.count, 1);
    assert!(!breaker.is_tripped());
}

#[test]
fn failure_exactly_at_window_edge_falls_out() {
    let clock = FakeClock::at(0);
    let breaker = CircuitBreaker::new(clock.clone());
    breaker.record_event();
    breaker.record_event();
    clock.advance(std::time::Duration::from_millis(60_000));
    // a failure exactly 60s old is evicted before this one is counted
    let outcome = breaker.record_event();
    assert_eq!(outcome.count, 1);
    assert!(!breaker.is_tripped());
}

#[test]
fn second_trip_within_pause_is_idempotent() {
    let clock = FakeClock::at(0);
    let breaker = CircuitBreaker::new(clock.clone());
    for _ in 0..5 {
        breaker.record_event();
    }
    assert!(breaker.is_tripped());
    let outcome = breaker.record_event();
    assert!(!outcome.just_tripped, "second trip inside the pause must be a no-op");
}

#[test]
fn resets_after_pause_elapses() {
    let clock = FakeClock::at(0);
    let breaker = CircuitBreaker::new(clock.clone());
    for _ in 0..5 {
        breaker.record_event();
    }
    assert!(breaker.is_tripped());
    clock.advance(CircuitBreaker::<FakeClock>::pause_duration());
    assert!(!breaker.is_tripped());
}

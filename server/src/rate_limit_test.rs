use super::*;

fn limiter(per_key: usize, global: usize) -> RateLimiter {
    RateLimiter::with_config(RateLimitConfig {
        per_key_limit: per_key,
        per_key_window: Duration::from_secs(60),
        global_limit: global,
        global_window: Duration::from_secs(60),
    })
}

#[test]
fn per_key_allows_up_to_limit() {
    let rl = limiter(3, 100);
    let now = Instant::now();

    for i in 0..3 {
        assert!(rl.check_and_record_at("a@acme.com", now).is_ok(), "attempt {i} should succeed");
    }
    assert!(matches!(
        rl.check_and_record_at("a@acme.com", now),
        Err(RateLimitError::PerKeyExceeded { limit: 3, .. })
    ));
}

#[test]
fn per_key_limits_are_independent() {
    let rl = limiter(1, 100);
    let now = Instant::now();
    assert!(rl.check_and_record_at("a@acme.com", now).is_ok());
    assert!(rl.check_and_record_at("b@acme.com", now).is_ok());
    assert!(rl.check_and_record_at("a@acme.com", now).is_err());
}

#[test]
fn global_allows_up_to_limit() {
    let rl = limiter(100, 5);
    let now = Instant::now();

    for i in 0..5 {
        let key = format!("user{i}@acme.com");
        assert!(rl.check_and_record_at(&key, now).is_ok(), "attempt {i} should succeed");
    }
    assert!(matches!(
        rl.check_and_record_at("late@acme.com", now),
        Err(RateLimitError::GlobalExceeded { limit: 5, .. })
    ));
}

#[test]
fn window_expiry_restores_capacity() {
    let rl = limiter(1, 100);
    let start = Instant::now();
    assert!(rl.check_and_record_at("a@acme.com", start).is_ok());
    assert!(rl.check_and_record_at("a@acme.com", start).is_err());

    let later = start + Duration::from_secs(61);
    assert!(rl.check_and_record_at("a@acme.com", later).is_ok());
}

#[test]
fn rejected_attempt_is_not_recorded() {
    let rl = limiter(100, 1);
    let now = Instant::now();
    assert!(rl.check_and_record_at("a@acme.com", now).is_ok());
    assert!(rl.check_and_record_at("b@acme.com", now).is_err());

    let inner = rl.inner.lock().unwrap();
    assert!(inner.key_attempts.get("b@acme.com").is_none_or(VecDeque::is_empty));
    assert_eq!(inner.global_attempts.len(), 1);
}

#[test]
fn expired_keys_are_swept_once_map_is_large() {
    let rl = RateLimiter::with_config(RateLimitConfig {
        per_key_limit: 10,
        per_key_window: Duration::from_secs(1),
        global_limit: usize::MAX,
        global_window: Duration::from_secs(1),
    });
    let start = Instant::now();
    for i in 0..=MAX_TRACKED_KEYS {
        rl.check_and_record_at(&format!("user{i}@acme.com"), start).unwrap();
    }
    rl.check_and_record_at("late@acme.com", start + Duration::from_secs(3600)).unwrap();

    let inner = rl.inner.lock().unwrap();
    assert_eq!(inner.key_attempts.len(), 1);
    assert!(inner.key_attempts.contains_key("late@acme.com"));
}

#[test]
fn sweep_keeps_keys_still_inside_their_window() {
    let rl = RateLimiter::with_config(RateLimitConfig {
        per_key_limit: 10,
        per_key_window: Duration::from_secs(60),
        global_limit: usize::MAX,
        global_window: Duration::from_secs(60),
    });
    let start = Instant::now();
    for i in 0..=MAX_TRACKED_KEYS {
        rl.check_and_record_at(&format!("user{i}@acme.com"), start).unwrap();
    }
    rl.check_and_record_at("late@acme.com", start + Duration::from_secs(1)).unwrap();

    assert_eq!(rl.inner.lock().unwrap().key_attempts.len(), MAX_TRACKED_KEYS + 2);
}

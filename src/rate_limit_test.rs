use std::net::Ipv4Addr;

use super::*;

fn ip(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
}

#[test]
fn allows_up_to_limit_then_rejects() {
    let rl = RateLimiter::default();
    let now = Instant::now();

    for i in 0..DEFAULT_UPLOAD_RATE_LIMIT {
        assert!(rl.check_and_record_at(ip(1), now).is_ok(), "upload {i} should succeed");
    }
    assert_eq!(
        rl.check_and_record_at(ip(1), now),
        Err(RateLimitError { limit: DEFAULT_UPLOAD_RATE_LIMIT, window_secs: DEFAULT_UPLOAD_RATE_WINDOW_SECS })
    );
}

#[test]
fn clients_are_tracked_independently() {
    let rl = RateLimiter::new(1, Duration::from_secs(60));
    let now = Instant::now();

    rl.check_and_record_at(ip(1), now).unwrap();
    assert!(rl.check_and_record_at(ip(1), now).is_err());
    assert!(rl.check_and_record_at(ip(2), now).is_ok());
}

#[test]
fn window_expiry_allows_new_requests() {
    let rl = RateLimiter::new(2, Duration::from_secs(600));
    let start = Instant::now();

    rl.check_and_record_at(ip(1), start).unwrap();
    rl.check_and_record_at(ip(1), start + Duration::from_secs(300)).unwrap();
    assert!(rl.check_and_record_at(ip(1), start + Duration::from_secs(599)).is_err());

    // First upload leaves the window; one slot frees up.
    assert!(rl.check_and_record_at(ip(1), start + Duration::from_secs(600)).is_ok());
    assert!(rl.check_and_record_at(ip(1), start + Duration::from_secs(601)).is_err());
}

#[test]
fn rejected_attempts_are_not_recorded() {
    let rl = RateLimiter::new(1, Duration::from_secs(10));
    let start = Instant::now();

    rl.check_and_record_at(ip(1), start).unwrap();
    for s in 1..10 {
        assert!(rl.check_and_record_at(ip(1), start + Duration::from_secs(s)).is_err());
    }
    assert!(rl.check_and_record_at(ip(1), start + Duration::from_secs(10)).is_ok());
}

#[test]
fn idle_clients_are_evicted() {
    let rl = RateLimiter::new(5, Duration::from_secs(1));
    let start = Instant::now();
    rl.check_and_record_at(ip(1), start).unwrap();
    rl.check_and_record_at(ip(2), start + Duration::from_secs(5)).unwrap();

    let clients = rl.inner.lock().unwrap();
    assert_eq!(clients.len(), 1);
    assert!(clients.contains_key(&ip(2)));
}

#[test]
fn error_message_matches_client_contract() {
    let err = RateLimitError { limit: 10, window_secs: 600 };
    assert_eq!(err.to_string(), "Upload too many times, slow down.");
}

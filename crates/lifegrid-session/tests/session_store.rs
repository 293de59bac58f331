use std::thread;
use std::time::Duration;

use lifegrid_core::{Dataset, SourceFormat};
use lifegrid_session::{SessionLimits, SessionStore};

fn quick_limits(max_sessions: usize, timeout: Duration) -> SessionLimits {
    SessionLimits {
        max_sessions,
        idle_timeout: timeout,
    }
}

#[test]
fn ids_are_fresh_hex_strings() {
    let mut store = SessionStore::default();
    let first = store.create().unwrap();
    let second = store.create().unwrap();

    assert_ne!(first, second);
    assert_eq!(store.len(), 2);
    for id in [&first, &second] {
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

#[test]
fn default_limits_match_the_service_settings() {
    let limits = SessionLimits::default();
    assert_eq!(limits.max_sessions, 100);
    assert_eq!(limits.idle_timeout, Duration::from_secs(30 * 60));
}

#[test]
fn handles_share_state_and_misses_return_none() {
    let mut store = SessionStore::default();
    let id = store.create().unwrap();

    {
        let handle = store.get(&id).unwrap();
        let mut session = handle.lock().unwrap();
        session.attach_dataset(Dataset::new("probe", SourceFormat::Csv));
    }
    let handle = store.get(&id).unwrap();
    assert!(handle.lock().unwrap().is_loaded());

    assert!(store.get("no-such-id").is_none());
}

#[test]
fn removal_stops_lookups_but_live_handles_survive() {
    let mut store = SessionStore::default();
    let id = store.create().unwrap();
    let handle = store.get(&id).unwrap();

    assert!(store.remove(&id));
    assert!(!store.remove(&id));
    assert!(store.get(&id).is_none());
    assert!(store.is_empty());

    // The Arc keeps the removed session alive for whoever held it.
    assert!(!handle.lock().unwrap().is_loaded());
}

#[test]
fn create_rejects_at_capacity_until_something_expires() {
    let mut store = SessionStore::new(quick_limits(2, Duration::from_millis(100)));
    store.create().unwrap();
    store.create().unwrap();

    let err = store.create().unwrap_err();
    assert_eq!(err.info().code, "store-full");
    assert_eq!(err.info().context["max_sessions"], "2");
    assert_eq!(err.info().context["active"], "2");

    thread::sleep(Duration::from_millis(200));
    let id = store.create().unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.get(&id).is_some());
}

#[test]
fn cleanup_sweeps_idle_sessions_and_get_refreshes_the_clock() {
    let mut store = SessionStore::new(quick_limits(10, Duration::from_millis(200)));
    let kept = store.create().unwrap();
    let dropped = store.create().unwrap();

    thread::sleep(Duration::from_millis(120));
    assert!(store.get(&kept).is_some());
    thread::sleep(Duration::from_millis(120));

    assert_eq!(store.cleanup_expired(), 1);
    assert_eq!(store.len(), 1);
    assert!(store.get(&kept).is_some());
    assert!(store.get(&dropped).is_none());
}

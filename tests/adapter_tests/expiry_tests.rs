//! Tests for expiration commands
//!
//! These tests verify:
//! - TTL/PTTL sentinels (-2 missing, -1 no expiry)
//! - EXPIRE/PEXPIRE/PERSIST round trips against a manual clock
//! - SETEX/PSETEX validation and rounding
//! - Records vanish once their expiration passes

use binkv::store::MemoryStore;
use binkv::{Adapter, AdapterError, Config, ManualClock};

// =============================================================================
// Helper Functions
// =============================================================================

const START_MS: u64 = 1_700_000_000_000;

fn setup_adapter() -> (ManualClock, Adapter<MemoryStore>) {
    let clock = ManualClock::new(START_MS);
    let store = MemoryStore::builder()
        .nodes(2)
        .clock(clock.clone())
        .with_module("redis.lua")
        .build();
    let adapter = Adapter::with_clock(store, Config::default(), clock.clone()).unwrap();
    (clock, adapter)
}

// =============================================================================
// TTL Sentinel Tests
// =============================================================================

#[test]
fn test_ttl_missing_key() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.ttl("missing").unwrap(), -2);
    assert_eq!(adapter.pttl("missing").unwrap(), -2);
}

#[test]
fn test_ttl_without_expiry() {
    let (_clock, adapter) = setup_adapter();

    adapter.set("k", "v").unwrap();

    assert_eq!(adapter.ttl("k").unwrap(), -1);
    assert_eq!(adapter.pttl("k").unwrap(), -1);
}

// =============================================================================
// EXPIRE / PERSIST Tests
// =============================================================================

#[test]
fn test_expire_then_ttl() {
    let (clock, adapter) = setup_adapter();

    adapter.set("k", "v").unwrap();

    assert_eq!(adapter.expire("k", 100).unwrap(), 1);
    assert_eq!(adapter.ttl("k").unwrap(), 100);

    clock.advance_secs(40);
    assert_eq!(adapter.ttl("k").unwrap(), 60);
    assert_eq!(adapter.pttl("k").unwrap(), 60_000);
}

#[test]
fn test_expire_missing_key() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.expire("missing", 10).unwrap(), 0);
    assert!(!adapter.exists("missing").unwrap());
}

#[test]
fn test_expire_non_positive_deletes() {
    let (_clock, adapter) = setup_adapter();

    adapter.set("k", "v").unwrap();

    assert_eq!(adapter.expire("k", 0).unwrap(), 1);
    assert!(!adapter.exists("k").unwrap());
    assert_eq!(adapter.expire("k", -5).unwrap(), 0);
}

#[test]
fn test_expire_out_of_range() {
    let (_clock, adapter) = setup_adapter();

    adapter.set("k", "v").unwrap();

    assert!(matches!(
        adapter.expire("k", i64::from(u32::MAX) + 1),
        Err(AdapterError::InvalidArgument(_))
    ));
    assert_eq!(adapter.ttl("k").unwrap(), -1);
}

#[test]
fn test_pexpire_rounds_up() {
    let (_clock, adapter) = setup_adapter();

    adapter.set("k", "v").unwrap();

    assert_eq!(adapter.pexpire("k", 1500).unwrap(), 1);
    assert_eq!(adapter.ttl("k").unwrap(), 2);
    assert_eq!(adapter.pttl("k").unwrap(), 2000);
}

#[test]
fn test_persist() {
    let (_clock, adapter) = setup_adapter();

    adapter.setex("k", 100, "v").unwrap();

    assert_eq!(adapter.persist("k").unwrap(), 1);
    assert_eq!(adapter.ttl("k").unwrap(), -1);
}

#[test]
fn test_persist_missing_key_reports_one() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.persist("missing").unwrap(), 1);
    assert!(!adapter.exists("missing").unwrap());
}

#[test]
fn test_expire_on_list() {
    let (clock, adapter) = setup_adapter();

    adapter.rpush("jobs", "a").unwrap();
    adapter.expire("jobs", 10).unwrap();

    assert_eq!(adapter.rpush("jobs", "b").unwrap(), 2);
    assert_eq!(adapter.ttl("jobs").unwrap(), 10);

    clock.advance_secs(11);
    assert_eq!(adapter.llen("jobs").unwrap(), 0);
    assert_eq!(adapter.ttl("jobs").unwrap(), -2);
}

// =============================================================================
// SETEX / PSETEX Tests
// =============================================================================

#[test]
fn test_setex_expires() {
    let (clock, adapter) = setup_adapter();

    adapter.setex("session", 30, "token").unwrap();
    assert_eq!(adapter.ttl("session").unwrap(), 30);

    clock.advance_secs(29);
    assert_eq!(adapter.get_string("session").unwrap(), Some("token".to_string()));

    clock.advance_secs(1);
    assert_eq!(adapter.get("session").unwrap(), None);
    assert_eq!(adapter.ttl("session").unwrap(), -2);
}

#[test]
fn test_setex_rejects_non_positive() {
    let (_clock, adapter) = setup_adapter();

    assert!(matches!(adapter.setex("k", 0, "v"), Err(AdapterError::InvalidArgument(_))));
    assert!(matches!(adapter.setex("k", -1, "v"), Err(AdapterError::InvalidArgument(_))));
    assert!(!adapter.exists("k").unwrap());
}

#[test]
fn test_psetex() {
    let (_clock, adapter) = setup_adapter();

    adapter.psetex("k", 2500, "v").unwrap();

    assert_eq!(adapter.ttl("k").unwrap(), 3);
    assert!(matches!(adapter.psetex("k", 0, "v"), Err(AdapterError::InvalidArgument(_))));
}

#[test]
fn test_set_clears_ttl() {
    let (_clock, adapter) = setup_adapter();

    adapter.setex("k", 100, "v").unwrap();
    adapter.set("k", "w").unwrap();

    assert_eq!(adapter.ttl("k").unwrap(), -1);
}

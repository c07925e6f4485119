//! Tests for counter and append commands
//!
//! These tests verify:
//! - INCR/INCRBY/DECR/DECRBY start from zero and return the new value
//! - Type and overflow errors leave the stored value untouched
//! - Counters keep the record's TTL and stay visible to KEYS
//! - INCRBYFLOAT and APPEND
//! - Concurrent increments are never lost

use std::thread;

use binkv::store::MemoryStore;
use binkv::{Adapter, AdapterError, Config, ManualClock, Value};

// =============================================================================
// Helper Functions
// =============================================================================

const START_MS: u64 = 1_700_000_000_000;

fn setup_adapter() -> (ManualClock, Adapter<MemoryStore>) {
    let clock = ManualClock::new(START_MS);
    let store = MemoryStore::builder()
        .nodes(3)
        .clock(clock.clone())
        .with_module("redis.lua")
        .build();
    let adapter = Adapter::with_clock(store, Config::default(), clock.clone()).unwrap();
    (clock, adapter)
}

// =============================================================================
// Integer Counter Tests
// =============================================================================

#[test]
fn test_incr_from_missing() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.incr("hits").unwrap(), 1);
    assert_eq!(adapter.incr("hits").unwrap(), 2);
    assert_eq!(adapter.get("hits").unwrap(), Some(Value::Int(2)));
}

#[test]
fn test_incr_by_and_decr() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.incr_by("n", 10).unwrap(), 10);
    assert_eq!(adapter.incr_by("n", -3).unwrap(), 7);
    assert_eq!(adapter.decr("n").unwrap(), 6);
    assert_eq!(adapter.decr_by("n", 10).unwrap(), -4);
}

#[test]
fn test_decr_from_missing() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.decr("fresh").unwrap(), -1);
}

#[test]
fn test_incr_on_string_is_type_mismatch() {
    let (_clock, adapter) = setup_adapter();

    adapter.set("name", "ada").unwrap();

    assert!(matches!(adapter.incr("name"), Err(AdapterError::TypeMismatch(_))));
    assert_eq!(adapter.get_string("name").unwrap(), Some("ada".to_string()));
}

#[test]
fn test_incr_overflow() {
    let (_clock, adapter) = setup_adapter();

    adapter.set("big", i64::MAX).unwrap();

    assert!(matches!(adapter.incr("big"), Err(AdapterError::InvalidArgument(_))));
    assert_eq!(adapter.get("big").unwrap(), Some(Value::Int(i64::MAX)));
}

#[test]
fn test_decr_by_min_overflows() {
    let (_clock, adapter) = setup_adapter();

    assert!(matches!(
        adapter.decr_by("n", i64::MIN),
        Err(AdapterError::InvalidArgument(_))
    ));
    assert!(!adapter.exists("n").unwrap());
}

#[test]
fn test_incr_keeps_ttl() {
    let (clock, adapter) = setup_adapter();

    adapter.setex("counter", 100, 5i64).unwrap();
    clock.advance_secs(10);

    assert_eq!(adapter.incr("counter").unwrap(), 6);
    assert_eq!(adapter.ttl("counter").unwrap(), 90);
}

#[test]
fn test_incr_writes_key_bin() {
    let (_clock, adapter) = setup_adapter();

    adapter.incr("visits").unwrap();

    assert!(adapter.keys("visits").unwrap().contains("visits"));
}

#[test]
fn test_incr_by_float_writes_key_bin() {
    let (_clock, adapter) = setup_adapter();

    adapter.incr_by_float("f", 1.5).unwrap();

    assert!(adapter.exists("f").unwrap());
    assert!(adapter.keys(".*").unwrap().contains("f"));
}

#[test]
fn test_concurrent_incr() {
    let (_clock, adapter) = setup_adapter();

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..100 {
                    adapter.incr("shared").unwrap();
                }
            });
        }
    });

    assert_eq!(adapter.get("shared").unwrap(), Some(Value::Int(800)));
}

// =============================================================================
// Float Counter Tests
// =============================================================================

#[test]
fn test_incr_by_float() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.incr_by_float("f", 1.5).unwrap(), 1.5);
    assert_eq!(adapter.incr_by_float("f", 2.0).unwrap(), 3.5);
}

#[test]
fn test_incr_by_float_on_integer() {
    let (_clock, adapter) = setup_adapter();

    adapter.set("n", 10i64).unwrap();

    assert_eq!(adapter.incr_by_float("n", 0.5).unwrap(), 10.5);
}

#[test]
fn test_incr_by_float_rejects_non_finite() {
    let (_clock, adapter) = setup_adapter();

    assert!(matches!(
        adapter.incr_by_float("f", f64::NAN),
        Err(AdapterError::InvalidArgument(_))
    ));
    assert!(matches!(
        adapter.incr_by_float("f", f64::INFINITY),
        Err(AdapterError::InvalidArgument(_))
    ));
}

#[test]
fn test_incr_by_float_on_list_is_type_mismatch() {
    let (_clock, adapter) = setup_adapter();

    adapter.rpush("l", "a").unwrap();

    assert!(matches!(
        adapter.incr_by_float("l", 1.0),
        Err(AdapterError::TypeMismatch(_))
    ));
}

// =============================================================================
// APPEND Tests
// =============================================================================

#[test]
fn test_append() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.append("msg", "hello").unwrap(), 5);
    assert_eq!(adapter.append("msg", " world").unwrap(), 11);
    assert_eq!(adapter.get_string("msg").unwrap(), Some("hello world".to_string()));
}

#[test]
fn test_append_to_integer_extends_decimal_text() {
    let (_clock, adapter) = setup_adapter();

    adapter.set("n", 10i64).unwrap();

    assert_eq!(adapter.append("n", "5").unwrap(), 3);
    assert_eq!(adapter.get("n").unwrap(), Some(Value::from("105")));
}

#[test]
fn test_append_to_float() {
    let (_clock, adapter) = setup_adapter();

    adapter.incr_by_float("f", 1.5).unwrap();

    assert_eq!(adapter.append("f", "0").unwrap(), 4);
    assert_eq!(adapter.get_string("f").unwrap(), Some("1.50".to_string()));
}

#[test]
fn test_append_to_list_is_type_mismatch() {
    let (_clock, adapter) = setup_adapter();

    adapter.rpush("l", "a").unwrap();

    assert!(matches!(adapter.append("l", "x"), Err(AdapterError::TypeMismatch(_))));
}

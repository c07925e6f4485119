//! Tests for hash commands
//!
//! These tests verify:
//! - Field set/get and the created/overwritten return values
//! - Multi-field reads and writes
//! - Field counters, including string-encoded integers
//! - Field removal and whole-hash views

use std::collections::{HashMap, HashSet};

use binkv::store::MemoryStore;
use binkv::{Adapter, AdapterError, Config, ManualClock};

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
// HSET / HGET Tests
// =============================================================================

#[test]
fn test_hset_then_hget() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.hset("user", "name", "ada").unwrap(), 1);
    assert_eq!(adapter.hset("user", "name", "grace").unwrap(), 0);

    assert_eq!(adapter.hget("user", "name").unwrap(), Some("grace".to_string()));
    assert_eq!(adapter.hget("user", "missing").unwrap(), None);
    assert_eq!(adapter.hget("nobody", "name").unwrap(), None);
}

#[test]
fn test_hsetnx() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.hsetnx("h", "f", "first").unwrap(), 1);
    assert_eq!(adapter.hsetnx("h", "f", "second").unwrap(), 0);

    assert_eq!(adapter.hget("h", "f").unwrap(), Some("first".to_string()));
}

#[test]
fn test_hset_on_list_is_type_mismatch() {
    let (_clock, adapter) = setup_adapter();

    adapter.rpush("l", "a").unwrap();

    assert!(matches!(adapter.hset("l", "f", "v"), Err(AdapterError::TypeMismatch(_))));
}

// =============================================================================
// Multi-field Tests
// =============================================================================

#[test]
fn test_hmset_then_hmget() {
    let (_clock, adapter) = setup_adapter();

    adapter.hmset("h", &[("a", "1"), ("b", "2")]).unwrap();

    let values = adapter.hmget("h", &["a", "missing", "b"]).unwrap();

    assert_eq!(values, vec![Some("1".to_string()), None, Some("2".to_string())]);
}

#[test]
fn test_hmset_requires_entries() {
    let (_clock, adapter) = setup_adapter();

    let entries: [(&str, &str); 0] = [];
    assert!(matches!(
        adapter.hmset("h", &entries),
        Err(AdapterError::InvalidArgument(_))
    ));
}

#[test]
fn test_hmget_missing_hash() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.hmget("nobody", &["a", "b"]).unwrap(), vec![None, None]);
}

// =============================================================================
// Counter Tests
// =============================================================================

#[test]
fn test_hincr_by() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.hincr_by("h", "n", 5).unwrap(), 5);
    assert_eq!(adapter.hincr_by("h", "n", -2).unwrap(), 3);
}

#[test]
fn test_hincr_by_on_string_encoded_integer() {
    let (_clock, adapter) = setup_adapter();

    adapter.hset("h", "n", "10").unwrap();

    assert_eq!(adapter.hincr_by("h", "n", 1).unwrap(), 11);
}

#[test]
fn test_hincr_by_on_text_is_type_mismatch() {
    let (_clock, adapter) = setup_adapter();

    adapter.hset("h", "name", "ada").unwrap();

    assert!(matches!(adapter.hincr_by("h", "name", 1), Err(AdapterError::TypeMismatch(_))));
}

#[test]
fn test_hincr_by_float() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.hincr_by_float("h", "x", 0.5).unwrap(), 0.5);
    assert_eq!(adapter.hincr_by_float("h", "x", 1.25).unwrap(), 1.75);
    assert!(matches!(
        adapter.hincr_by_float("h", "x", f64::NAN),
        Err(AdapterError::InvalidArgument(_))
    ));
}

// =============================================================================
// Removal / View Tests
// =============================================================================

#[test]
fn test_hexists_and_hdel() {
    let (_clock, adapter) = setup_adapter();

    adapter.hset("h", "a", "1").unwrap();
    adapter.hset("h", "b", "2").unwrap();

    assert!(adapter.hexists("h", "a").unwrap());
    assert_eq!(adapter.hdel("h", "a").unwrap(), 1);
    assert_eq!(adapter.hdel("h", "a").unwrap(), 0);
    assert!(!adapter.hexists("h", "a").unwrap());
    assert_eq!(adapter.hlen("h").unwrap(), 1);
}

#[test]
fn test_hdel_last_field_removes_hash() {
    let (_clock, adapter) = setup_adapter();

    adapter.hmset("h", &[("a", "1"), ("b", "2")]).unwrap();

    assert_eq!(adapter.hdel_many("h", &["a", "b", "c"]).unwrap(), 2);
    assert!(!adapter.exists("h").unwrap());
    assert_eq!(adapter.hlen("h").unwrap(), 0);
}

#[test]
fn test_hkeys_hvals_hgetall() {
    let (_clock, adapter) = setup_adapter();

    adapter.hmset("h", &[("a", "1"), ("b", "2")]).unwrap();

    let keys: HashSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
    assert_eq!(adapter.hkeys("h").unwrap(), keys);

    let mut vals = adapter.hvals("h").unwrap();
    vals.sort();
    assert_eq!(vals, vec!["1".to_string(), "2".to_string()]);

    let all: HashMap<String, String> = [("a", "1"), ("b", "2")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(adapter.hgetall("h").unwrap(), all);
}

#[test]
fn test_views_of_missing_hash() {
    let (_clock, adapter) = setup_adapter();

    assert!(adapter.hkeys("nobody").unwrap().is_empty());
    assert!(adapter.hvals("nobody").unwrap().is_empty());
    assert!(adapter.hgetall("nobody").unwrap().is_empty());
    assert_eq!(adapter.hlen("nobody").unwrap(), 0);
    assert!(!adapter.hexists("nobody", "f").unwrap());
}

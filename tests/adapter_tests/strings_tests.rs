//! Tests for string commands
//!
//! These tests verify:
//! - SET/GET round trips and the two-bin record layout
//! - Conditional writes (SETNX, SET XX, MSETNX)
//! - Batch reads keep order and length
//! - GETSET, STRLEN and GETRANGE
//! - Key typing (integer, string and blob keys stay distinct)

use binkv::store::{MemoryStore, RecordStore};
use binkv::policy::ReadPolicy;
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
// SET / GET Tests
// =============================================================================

#[test]
fn test_set_then_get() {
    let (_clock, adapter) = setup_adapter();

    let status = adapter.set("greeting", "hello").unwrap();

    assert!(status.is_ok());
    assert_eq!(adapter.get("greeting").unwrap(), Some(Value::from("hello")));
    assert_eq!(adapter.get_string("greeting").unwrap(), Some("hello".to_string()));
}

#[test]
fn test_get_missing_key() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.get("missing").unwrap(), None);
    assert_eq!(adapter.get_string("missing").unwrap(), None);
}

#[test]
fn test_set_writes_key_and_value_bins() {
    let (_clock, adapter) = setup_adapter();

    adapter.set("user:1", "ada").unwrap();

    let address = adapter.mapper().resolve_address("user:1").unwrap();
    let record = adapter
        .store()
        .get(&ReadPolicy::default(), &address, &[])
        .unwrap()
        .unwrap();
    assert_eq!(record.bin("redis-key-bin"), Some(&Value::from("user:1")));
    assert_eq!(record.bin("redis-bin"), Some(&Value::from("ada")));
    assert_eq!(record.bins.len(), 2);
}

#[test]
fn test_set_overwrites() {
    let (_clock, adapter) = setup_adapter();

    adapter.set("k", "first").unwrap();
    adapter.set("k", 2i64).unwrap();

    assert_eq!(adapter.get("k").unwrap(), Some(Value::Int(2)));
}

#[test]
fn test_set_rejects_nil() {
    let (_clock, adapter) = setup_adapter();

    let result = adapter.set("k", Value::Nil);

    assert!(matches!(result, Err(AdapterError::InvalidArgument(_))));
    assert!(!adapter.exists("k").unwrap());
}

#[test]
fn test_key_types_are_distinct() {
    let (_clock, adapter) = setup_adapter();

    adapter.set(42i64, "int").unwrap();
    adapter.set("42", "str").unwrap();
    adapter.set(b"42".to_vec(), "blob").unwrap();

    assert_eq!(adapter.get_string(42i64).unwrap(), Some("int".to_string()));
    assert_eq!(adapter.get_string(42i32).unwrap(), Some("int".to_string()));
    assert_eq!(adapter.get_string("42").unwrap(), Some("str".to_string()));
    assert_eq!(adapter.get_string(b"42".to_vec()).unwrap(), Some("blob".to_string()));
}

#[test]
fn test_unsupported_key_type() {
    let (_clock, adapter) = setup_adapter();

    let result = adapter.set(Value::Float(1.5), "x");

    assert!(matches!(result, Err(AdapterError::UnsupportedKeyType(_))));
}

#[test]
fn test_get_string_on_list_is_type_mismatch() {
    let (_clock, adapter) = setup_adapter();

    adapter.rpush("jobs", "a").unwrap();

    assert!(matches!(
        adapter.get_string("jobs"),
        Err(AdapterError::TypeMismatch(_))
    ));
    assert!(matches!(adapter.get("jobs").unwrap(), Some(Value::List(_))));
}

// =============================================================================
// Conditional Write Tests
// =============================================================================

#[test]
fn test_setnx() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.setnx("lock", "owner-1").unwrap(), 1);
    assert_eq!(adapter.setnx("lock", "owner-2").unwrap(), 0);

    assert_eq!(adapter.get_string("lock").unwrap(), Some("owner-1".to_string()));
}

#[test]
fn test_setxx() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.setxx("k", "v").unwrap(), 0);
    assert!(!adapter.exists("k").unwrap());

    adapter.set("k", "v").unwrap();
    assert_eq!(adapter.setxx("k", "w").unwrap(), 1);
    assert_eq!(adapter.get_string("k").unwrap(), Some("w".to_string()));
}

#[test]
fn test_msetnx_skips_existing_keys() {
    let (_clock, adapter) = setup_adapter();

    adapter.set("a", "original").unwrap();

    let written = adapter.msetnx(&[("a", "x"), ("b", "y"), ("c", "z")]).unwrap();

    assert_eq!(written, 2);
    assert_eq!(adapter.get_string("a").unwrap(), Some("original".to_string()));
    assert_eq!(adapter.get_string("b").unwrap(), Some("y".to_string()));
    assert_eq!(adapter.get_string("c").unwrap(), Some("z".to_string()));
}

// =============================================================================
// Batch Tests
// =============================================================================

#[test]
fn test_mset_then_mget_preserves_order() {
    let (_clock, adapter) = setup_adapter();

    adapter.mset(&[("a", "1"), ("c", "3")]).unwrap();

    let values = adapter.mget(&["a", "b", "c"]).unwrap();

    assert_eq!(
        values,
        vec![Some(Value::from("1")), None, Some(Value::from("3"))]
    );
}

#[test]
fn test_mget_empty() {
    let (_clock, adapter) = setup_adapter();

    let keys: [&str; 0] = [];
    assert!(adapter.mget(&keys).unwrap().is_empty());
}

// =============================================================================
// GETSET / STRLEN / GETRANGE Tests
// =============================================================================

#[test]
fn test_getset() {
    let (_clock, adapter) = setup_adapter();

    assert_eq!(adapter.getset("k", "first").unwrap(), None);
    assert_eq!(adapter.getset("k", "second").unwrap(), Some(Value::from("first")));
    assert_eq!(adapter.get_string("k").unwrap(), Some("second".to_string()));
}

#[test]
fn test_getset_writes_key_bin_on_create() {
    let (_clock, adapter) = setup_adapter();

    adapter.getset("g", "v").unwrap();
    adapter.getset(&b"raw"[..], "v").unwrap();

    assert!(adapter.keys(".*").unwrap().contains("g"));
    assert!(adapter.keys_binary(b".*").unwrap().contains(&b"raw".to_vec()));
}

#[test]
fn test_getset_keeps_key_bin_of_existing_record() {
    let (_clock, adapter) = setup_adapter();

    adapter.set("k", "old").unwrap();
    adapter.getset("k", "new").unwrap();

    assert!(adapter.keys("k").unwrap().contains("k"));
}

#[test]
fn test_strlen() {
    let (_clock, adapter) = setup_adapter();

    adapter.set("k", "hello").unwrap();

    assert_eq!(adapter.strlen("k").unwrap(), 5);
    assert_eq!(adapter.strlen("missing").unwrap(), 0);
}

#[test]
fn test_getrange() {
    let (_clock, adapter) = setup_adapter();

    adapter.set("k", "This is a string").unwrap();

    assert_eq!(adapter.getrange("k", 0, 3).unwrap(), "This");
    assert_eq!(adapter.getrange("k", -3, -1).unwrap(), "ing");
    assert_eq!(adapter.substr("k", 10, 100).unwrap(), "string");
    assert_eq!(adapter.getrange("missing", 0, -1).unwrap(), "");
}

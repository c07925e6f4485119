//! Tests for administrative commands and adapter startup
//!
//! These tests verify:
//! - DBSIZE sums object counts over every node, for the configured set only
//! - PING/ECHO and connectivity loss
//! - Procedure module registration happens at most once
//! - Config validation
//! - Timeouts and malformed procedure replies surface as typed errors

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use binkv::config::ProcedureModule;
use binkv::policy::{InfoPolicy, ReadPolicy, ScanPolicy, WritePolicy};
use binkv::store::{Bin, Language, MemoryStore, Operation, Record, RecordAddress, RecordStore, ScanCallback};
use binkv::{Adapter, AdapterError, Config, ModuleSource, Result, Value};
use tempfile::NamedTempFile;

// =============================================================================
// Helper Functions
// =============================================================================

const MODULE_BODY: &[u8] = b"function LLEN(rec, bin) return 0 end";

fn inline_config() -> Config {
    Config::builder().module_source_inline(MODULE_BODY).build()
}

fn setup_adapter() -> Adapter<MemoryStore> {
    let store = MemoryStore::builder().nodes(3).build();
    Adapter::new(store, inline_config()).unwrap()
}

/// Store that answers every procedure call with a status string
struct GarbledReplies {
    inner: MemoryStore,
}

impl RecordStore for GarbledReplies {
    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn get(&self, policy: &ReadPolicy, address: &RecordAddress, bins: &[&str]) -> Result<Option<Record>> {
        self.inner.get(policy, address, bins)
    }

    fn get_header(&self, policy: &ReadPolicy, address: &RecordAddress) -> Result<Option<Record>> {
        self.inner.get_header(policy, address)
    }

    fn put(&self, policy: &WritePolicy, address: &RecordAddress, bins: &[Bin]) -> Result<()> {
        self.inner.put(policy, address, bins)
    }

    fn delete(&self, policy: &WritePolicy, address: &RecordAddress) -> Result<bool> {
        self.inner.delete(policy, address)
    }

    fn exists(&self, policy: &ReadPolicy, address: &RecordAddress) -> Result<bool> {
        self.inner.exists(policy, address)
    }

    fn batch_get(
        &self,
        policy: &ReadPolicy,
        addresses: &[RecordAddress],
        bins: &[&str],
    ) -> Result<Vec<Option<Record>>> {
        self.inner.batch_get(policy, addresses, bins)
    }

    fn scan_all(
        &self,
        policy: &ScanPolicy,
        namespace: &str,
        set: &str,
        bins: &[&str],
        callback: &ScanCallback<'_>,
    ) -> Result<()> {
        self.inner.scan_all(policy, namespace, set, bins, callback)
    }

    fn operate(&self, policy: &WritePolicy, address: &RecordAddress, operations: &[Operation]) -> Result<Record> {
        self.inner.operate(policy, address, operations)
    }

    fn touch(&self, policy: &WritePolicy, address: &RecordAddress) -> Result<()> {
        self.inner.touch(policy, address)
    }

    fn execute(
        &self,
        _policy: &WritePolicy,
        _address: &RecordAddress,
        _module: &str,
        _function: &str,
        _args: &[Value],
    ) -> Result<Value> {
        Ok(Value::from("garbage"))
    }

    fn nodes(&self) -> Vec<String> {
        self.inner.nodes()
    }

    fn info(&self, policy: &InfoPolicy, node: &str, command: &str) -> Result<String> {
        self.inner.info(policy, node, command)
    }

    fn register_module(
        &self,
        policy: &InfoPolicy,
        source: &[u8],
        server_path: &str,
        language: Language,
    ) -> Result<()> {
        self.inner.register_module(policy, source, server_path, language)
    }
}

// =============================================================================
// DBSIZE Tests
// =============================================================================

#[test]
fn test_dbsize_empty() {
    let adapter = setup_adapter();

    assert_eq!(adapter.dbsize().unwrap(), 0);
}

#[test]
fn test_dbsize_counts_across_nodes() {
    let adapter = setup_adapter();

    for i in 0..30 {
        adapter.set(format!("key:{}", i), i as i64).unwrap();
    }
    adapter.rpush("list", "a").unwrap();

    assert_eq!(adapter.dbsize().unwrap(), 31);

    let nodes_used: std::collections::HashSet<String> = (0..30)
        .map(|i| {
            let address = adapter.mapper().resolve_address(format!("key:{}", i)).unwrap();
            adapter.store().node_of(&address).to_string()
        })
        .collect();
    assert!(nodes_used.len() > 1);
}

#[test]
fn test_dbsize_ignores_other_sets() {
    let store = Arc::new(MemoryStore::builder().nodes(3).build());
    let tweets = Adapter::new(Arc::clone(&store), Config::builder().set("tweets").module_source_inline(MODULE_BODY).build()).unwrap();
    let users = Adapter::new(Arc::clone(&store), Config::builder().set("users").module_source_inline(MODULE_BODY).build()).unwrap();

    tweets.set("t1", "hello").unwrap();
    tweets.set("t2", "world").unwrap();
    users.set("u1", "ada").unwrap();

    assert_eq!(tweets.dbsize().unwrap(), 2);
    assert_eq!(users.dbsize().unwrap(), 1);
    assert_eq!(store.record_count(), 3);
}

#[test]
fn test_dbsize_after_delete() {
    let adapter = setup_adapter();

    adapter.set("a", "1").unwrap();
    adapter.set("b", "2").unwrap();
    adapter.del("a").unwrap();

    assert_eq!(adapter.dbsize().unwrap(), 1);
}

// =============================================================================
// PING / ECHO Tests
// =============================================================================

#[test]
fn test_ping() {
    let adapter = setup_adapter();

    assert_eq!(adapter.ping().unwrap(), "PONG");
}

#[test]
fn test_ping_when_disconnected() {
    let adapter = setup_adapter();

    adapter.store().set_connected(false);

    assert!(matches!(adapter.ping(), Err(AdapterError::StoreUnavailable(_))));
    assert!(matches!(adapter.get("k"), Err(AdapterError::StoreUnavailable(_))));

    adapter.store().set_connected(true);
    assert_eq!(adapter.ping().unwrap(), "PONG");
}

#[test]
fn test_echo() {
    let adapter = setup_adapter();

    assert_eq!(adapter.echo("hello world"), "hello world");
}

// =============================================================================
// Registration Tests
// =============================================================================

#[test]
fn test_registers_module_once() {
    let store = Arc::new(MemoryStore::new());

    let _first = Adapter::new(Arc::clone(&store), inline_config()).unwrap();
    let _second = Adapter::new(Arc::clone(&store), inline_config()).unwrap();

    assert!(store.is_module_registered("redis.lua"));
    assert_eq!(store.registration_count(), 1);
}

#[test]
fn test_skips_registration_when_listed() {
    let store = Arc::new(MemoryStore::builder().with_module("redis.lua").build());

    let _adapter = Adapter::new(Arc::clone(&store), inline_config()).unwrap();

    assert_eq!(store.registration_count(), 0);
}

#[test]
fn test_registers_module_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(MODULE_BODY).unwrap();

    let module = ProcedureModule {
        source: ModuleSource::Path(file.path().to_path_buf()),
        ..ProcedureModule::default()
    };
    let store = Arc::new(MemoryStore::new());

    let _adapter = Adapter::new(Arc::clone(&store), Config::builder().module(module).build()).unwrap();

    assert_eq!(store.registration_count(), 1);
}

#[test]
fn test_custom_module_name_is_invoked() {
    let module = ProcedureModule {
        name: "collections".to_string(),
        filename: "collections.lua".to_string(),
        source: ModuleSource::Inline(MODULE_BODY.into()),
    };
    let store = Arc::new(MemoryStore::new());

    let adapter = Adapter::new(Arc::clone(&store), Config::builder().module(module).build()).unwrap();

    assert!(store.is_module_registered("collections.lua"));
    assert_eq!(adapter.rpush("l", "a").unwrap(), 1);
    assert_eq!(adapter.llen("l").unwrap(), 1);
}

#[test]
fn test_module_name_must_match_filename() {
    let module = ProcedureModule {
        name: "redis".to_string(),
        filename: "collections.lua".to_string(),
        source: ModuleSource::Inline(MODULE_BODY.into()),
    };

    let result = Adapter::new(MemoryStore::new(), Config::builder().module(module).build());

    assert!(matches!(result, Err(AdapterError::Config(_))));
}

#[test]
fn test_missing_module_file_is_fatal() {
    let module = ProcedureModule {
        source: ModuleSource::Path("/nonexistent/redis.lua".into()),
        ..ProcedureModule::default()
    };

    let result = Adapter::new(MemoryStore::new(), Config::builder().module(module).build());

    assert!(matches!(result, Err(AdapterError::Registration(_))));
}

#[test]
fn test_empty_module_body_is_fatal() {
    let config = Config::builder().module_source_inline(&b""[..]).build();

    let result = Adapter::new(MemoryStore::new(), config);

    assert!(matches!(result, Err(AdapterError::Registration(_))));
}

#[test]
fn test_registration_fails_when_disconnected() {
    let store = MemoryStore::new();
    store.set_connected(false);

    let result = Adapter::new(store, inline_config());

    assert!(matches!(result, Err(AdapterError::Registration(_))));
}

// =============================================================================
// Config Validation Tests
// =============================================================================

#[test]
fn test_rejects_invalid_config() {
    let cases = vec![
        Config::builder().namespace("").module_source_inline(MODULE_BODY).build(),
        Config::builder().set("").module_source_inline(MODULE_BODY).build(),
        Config::builder().value_bin("a-bin-name-that-is-too-long").module_source_inline(MODULE_BODY).build(),
        Config::builder().key_bin("same").value_bin("same").module_source_inline(MODULE_BODY).build(),
    ];

    for config in cases {
        let result = Adapter::new(MemoryStore::new(), config);
        assert!(matches!(result, Err(AdapterError::Config(_))));
    }
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_timeout() {
    let config = Config::builder().timeout_ms(10).module_source_inline(MODULE_BODY).build();
    let adapter = Adapter::new(MemoryStore::new(), config).unwrap();

    adapter.store().set_latency(Duration::from_millis(50));

    match adapter.get("k") {
        Err(AdapterError::Timeout(limit)) => assert_eq!(limit, Duration::from_millis(10)),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[test]
fn test_latency_within_timeout() {
    let config = Config::builder().timeout_ms(200).module_source_inline(MODULE_BODY).build();
    let adapter = Adapter::new(MemoryStore::new(), config).unwrap();

    adapter.store().set_latency(Duration::from_millis(5));

    adapter.set("k", "v").unwrap();
    assert_eq!(adapter.get_string("k").unwrap(), Some("v".to_string()));
}

#[test]
fn test_malformed_procedure_reply() {
    let store = GarbledReplies {
        inner: MemoryStore::new(),
    };
    let adapter = Adapter::new(store, inline_config()).unwrap();

    match adapter.llen("l") {
        Err(AdapterError::ProtocolMismatch { command, expected, found }) => {
            assert_eq!(command, "LLEN");
            assert_eq!(expected, "integer");
            assert_eq!(found, "string");
        }
        other => panic!("expected protocol mismatch, got {:?}", other),
    }
    assert!(matches!(adapter.hgetall("h"), Err(AdapterError::ProtocolMismatch { .. })));
    assert!(matches!(adapter.lrange("l", 0, -1), Err(AdapterError::ProtocolMismatch { .. })));
}

//! Store Module
//!
//! The boundary to the record store. Everything the adapter needs from the
//! store is expressed by the [`RecordStore`] trait; transport, cluster
//! discovery, retries and failover live behind it.
//!
//! ## Primitives
//! - Point read of named bins, header-only read, existence check
//! - Full write of named bins under an existence precondition
//! - Delete, touch (TTL update)
//! - Ordered batch read
//! - Full set scan with a per-record callback
//! - Atomic compound `operate` (put / add / append / get)
//! - Named procedure invocation with positional arguments
//! - Per-node administrative info text, module registration
//!
//! ## Backends
//! - [`MemoryStore`]: in-process backend for tests and the CLI sandbox

mod memory;
mod procedures;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::policy::{InfoPolicy, ReadPolicy, ScanPolicy, WritePolicy};
use crate::value::{Key, Value};

pub use memory::{MemoryStore, MemoryStoreBuilder};

// =============================================================================
// Record Types
// =============================================================================

/// Physical address of a record: (namespace, set, key)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordAddress {
    pub namespace: String,
    pub set: String,
    pub key: Key,
}

impl RecordAddress {
    pub fn new(namespace: impl Into<String>, set: impl Into<String>, key: Key) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.into(),
            key,
        }
    }

    /// Digest identifying the record inside its namespace
    pub fn digest(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(self.set.as_bytes());
        hasher.update(&self.key.digest_bytes());
        hasher.finalize()
    }
}

/// A named bin and its value
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub name: String,
    pub value: Value,
}

impl Bin {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A record as returned by the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Requested bins (empty for header reads)
    pub bins: HashMap<String, Value>,

    /// Write generation
    pub generation: u32,

    /// Expiration in seconds since the store epoch (0 = never)
    pub expiration: u32,
}

impl Record {
    pub fn bin(&self, name: &str) -> Option<&Value> {
        self.bins.get(name)
    }

    pub fn take_bin(&mut self, name: &str) -> Option<Value> {
        self.bins.remove(name)
    }
}

/// One step of an atomic `operate` request
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Write a bin
    Put(Bin),

    /// Add an integer to a bin (creates it when absent)
    Add(Bin),

    /// Append a string to a bin (creates it when absent)
    Append(Bin),

    /// Read a bin into the result record
    Get(String),
}

/// Name procedures of a module file are invoked under: the file name
/// without its extension (`redis.lua` -> `redis`)
pub fn module_name_of(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
}

/// Language of a procedure module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Lua,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Lua => "LUA",
        }
    }
}

/// Callback invoked for every record visited by a scan
pub type ScanCallback<'a> = dyn Fn(&RecordAddress, &Record) -> Result<()> + Sync + 'a;

// =============================================================================
// RecordStore
// =============================================================================

/// The record store as seen by the adapter
///
/// Every method is one blocking round trip and must honor the timeout carried
/// by its policy, failing with `Timeout` once it elapses. Implementations are
/// shared across threads; no method requires exclusive access.
pub trait RecordStore: Send + Sync {
    /// Whether the store currently has a live connection to the cluster
    fn is_connected(&self) -> bool;

    /// Read the named bins (all bins when `bins` is empty)
    ///
    /// Returns `None` if the record does not exist.
    fn get(&self, policy: &ReadPolicy, address: &RecordAddress, bins: &[&str]) -> Result<Option<Record>>;

    /// Read generation and expiration only
    fn get_header(&self, policy: &ReadPolicy, address: &RecordAddress) -> Result<Option<Record>>;

    /// Write bins under the policy's existence precondition and expiration
    fn put(&self, policy: &WritePolicy, address: &RecordAddress, bins: &[Bin]) -> Result<()>;

    /// Delete a record; returns whether it existed
    fn delete(&self, policy: &WritePolicy, address: &RecordAddress) -> Result<bool>;

    fn exists(&self, policy: &ReadPolicy, address: &RecordAddress) -> Result<bool>;

    /// Read many records; result has the same order and length as `addresses`
    fn batch_get(
        &self,
        policy: &ReadPolicy,
        addresses: &[RecordAddress],
        bins: &[&str],
    ) -> Result<Vec<Option<Record>>>;

    /// Visit every record of a set, passing only the named bins
    fn scan_all(
        &self,
        policy: &ScanPolicy,
        namespace: &str,
        set: &str,
        bins: &[&str],
        callback: &ScanCallback<'_>,
    ) -> Result<()>;

    /// Apply `operations` to one record as a single indivisible request
    fn operate(&self, policy: &WritePolicy, address: &RecordAddress, operations: &[Operation]) -> Result<Record>;

    /// Reset a record's expiration from the policy, without touching bins
    fn touch(&self, policy: &WritePolicy, address: &RecordAddress) -> Result<()>;

    /// Invoke `module.function` against one record
    fn execute(
        &self,
        policy: &WritePolicy,
        address: &RecordAddress,
        module: &str,
        function: &str,
        args: &[Value],
    ) -> Result<Value>;

    /// Names of the cluster nodes
    fn nodes(&self) -> Vec<String>;

    /// Issue an administrative info command against one node
    fn info(&self, policy: &InfoPolicy, node: &str, command: &str) -> Result<String>;

    /// Upload a procedure module under `server_path`
    fn register_module(
        &self,
        policy: &InfoPolicy,
        source: &[u8],
        server_path: &str,
        language: Language,
    ) -> Result<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn get(&self, policy: &ReadPolicy, address: &RecordAddress, bins: &[&str]) -> Result<Option<Record>> {
        (**self).get(policy, address, bins)
    }

    fn get_header(&self, policy: &ReadPolicy, address: &RecordAddress) -> Result<Option<Record>> {
        (**self).get_header(policy, address)
    }

    fn put(&self, policy: &WritePolicy, address: &RecordAddress, bins: &[Bin]) -> Result<()> {
        (**self).put(policy, address, bins)
    }

    fn delete(&self, policy: &WritePolicy, address: &RecordAddress) -> Result<bool> {
        (**self).delete(policy, address)
    }

    fn exists(&self, policy: &ReadPolicy, address: &RecordAddress) -> Result<bool> {
        (**self).exists(policy, address)
    }

    fn batch_get(
        &self,
        policy: &ReadPolicy,
        addresses: &[RecordAddress],
        bins: &[&str],
    ) -> Result<Vec<Option<Record>>> {
        (**self).batch_get(policy, addresses, bins)
    }

    fn scan_all(
        &self,
        policy: &ScanPolicy,
        namespace: &str,
        set: &str,
        bins: &[&str],
        callback: &ScanCallback<'_>,
    ) -> Result<()> {
        (**self).scan_all(policy, namespace, set, bins, callback)
    }

    fn operate(&self, policy: &WritePolicy, address: &RecordAddress, operations: &[Operation]) -> Result<Record> {
        (**self).operate(policy, address, operations)
    }

    fn touch(&self, policy: &WritePolicy, address: &RecordAddress) -> Result<()> {
        (**self).touch(policy, address)
    }

    fn execute(
        &self,
        policy: &WritePolicy,
        address: &RecordAddress,
        module: &str,
        function: &str,
        args: &[Value],
    ) -> Result<Value> {
        (**self).execute(policy, address, module, function, args)
    }

    fn nodes(&self) -> Vec<String> {
        (**self).nodes()
    }

    fn info(&self, policy: &InfoPolicy, node: &str, command: &str) -> Result<String> {
        (**self).info(policy, node, command)
    }

    fn register_module(
        &self,
        policy: &InfoPolicy,
        source: &[u8],
        server_path: &str,
        language: Language,
    ) -> Result<()> {
        (**self).register_module(policy, source, server_path, language)
    }
}

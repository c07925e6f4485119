//! In-memory record store
//!
//! A `RecordStore` backed by process memory, for tests, benchmarks and the
//! CLI sandbox. It models the parts of a real cluster the adapter depends on:
//!
//! - Records are spread over simulated nodes by a CRC32 digest of
//!   (set, key), the way a cluster assigns partitions
//! - Expiration is stored in store-epoch seconds and enforced lazily on
//!   access against an injectable [`Clock`]
//! - `operate` and procedure calls run under the owning node's write lock,
//!   so they are indivisible per record
//! - `info` answers `sets` and `udf-list` per node
//! - An optional per-request latency makes policy timeouts observable
//!
//! This backend is NOT durable - data is lost on drop.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::error::{AdapterError, Result};
use crate::info::{SETS_COMMAND, UDF_LIST_COMMAND};
use crate::policy::{Expiration, InfoPolicy, ReadPolicy, RecordExistsAction, ScanPolicy, WritePolicy};
use crate::ttl::{expiration_from_ttl, unix_ms_to_store_secs, Clock, SystemClock, NEVER_EXPIRES};
use crate::value::Value;

use super::procedures::{self, ProcedureError};
use super::{module_name_of, Bin, Language, Operation, Record, RecordAddress, RecordStore, ScanCallback};

/// Number of partitions records are digested into
const PARTITION_COUNT: u32 = 4096;

/// A record as held by a node
#[derive(Debug, Clone)]
struct StoredRecord {
    bins: HashMap<String, Value>,
    generation: u32,
    expiration: u32,
}

impl StoredRecord {
    fn is_live(&self, now_store_secs: u64) -> bool {
        self.expiration == NEVER_EXPIRES || u64::from(self.expiration) > now_store_secs
    }

    /// Copy out the requested bins (all when `bins` is empty)
    fn project(&self, bins: &[&str]) -> Record {
        let selected = if bins.is_empty() {
            self.bins.clone()
        } else {
            bins.iter()
                .filter_map(|name| self.bins.get(*name).map(|v| (name.to_string(), v.clone())))
                .collect()
        };
        Record {
            bins: selected,
            generation: self.generation,
            expiration: self.expiration,
        }
    }

    fn header(&self) -> Record {
        Record {
            bins: HashMap::new(),
            generation: self.generation,
            expiration: self.expiration,
        }
    }
}

/// One simulated cluster node
struct MemoryNode {
    name: String,
    records: RwLock<HashMap<RecordAddress, StoredRecord>>,
}

/// A registered procedure module
#[derive(Debug, Clone)]
struct RegisteredModule {
    hash: u32,
    language: Language,
}

/// In-memory implementation of `RecordStore`
///
/// ## Concurrency
/// - Each node's records sit behind their own `RwLock`
/// - Reads take the read lock; writes, `operate` and `execute` take the
///   write lock of the single node owning the record
/// - Scans snapshot each node under its read lock, then run callbacks
///   without holding any lock
pub struct MemoryStore {
    nodes: Vec<MemoryNode>,
    clock: Arc<dyn Clock>,

    /// Namespace default TTL in seconds (0 = never expire)
    default_ttl: u32,

    modules: RwLock<BTreeMap<String, RegisteredModule>>,
    registrations: AtomicU64,

    connected: AtomicBool,
    latency: Mutex<Duration>,
}

/// Builder for MemoryStore
pub struct MemoryStoreBuilder {
    node_count: usize,
    clock: Arc<dyn Clock>,
    default_ttl: u32,
    latency: Duration,
    modules: Vec<String>,
}

impl Default for MemoryStoreBuilder {
    fn default() -> Self {
        Self {
            node_count: 1,
            clock: Arc::new(SystemClock),
            default_ttl: 0,
            latency: Duration::ZERO,
            modules: Vec::new(),
        }
    }
}

impl MemoryStoreBuilder {
    /// Number of simulated nodes (at least 1)
    pub fn nodes(mut self, count: usize) -> Self {
        self.node_count = count.max(1);
        self
    }

    /// Clock used for expiration
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Namespace default TTL applied to writes without an override
    pub fn default_ttl_secs(mut self, secs: u32) -> Self {
        self.default_ttl = secs;
        self
    }

    /// Simulated latency of every request
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Start with a procedure module already registered
    pub fn with_module(mut self, filename: impl Into<String>) -> Self {
        self.modules.push(filename.into());
        self
    }

    pub fn build(self) -> MemoryStore {
        let nodes = (0..self.node_count)
            .map(|i| MemoryNode {
                name: format!("BB9{:013X}", i + 1),
                records: RwLock::new(HashMap::new()),
            })
            .collect();

        let modules = self
            .modules
            .into_iter()
            .map(|filename| {
                (
                    filename,
                    RegisteredModule {
                        hash: 0,
                        language: Language::Lua,
                    },
                )
            })
            .collect();

        MemoryStore {
            nodes,
            clock: self.clock,
            default_ttl: self.default_ttl,
            modules: RwLock::new(modules),
            registrations: AtomicU64::new(0),
            connected: AtomicBool::new(true),
            latency: Mutex::new(self.latency),
        }
    }
}

impl MemoryStore {
    /// Create a single-node store using the system clock
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::default()
    }

    // =========================================================================
    // Fault Injection / Inspection
    // =========================================================================

    /// Simulate losing (or regaining) the cluster connection
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Change the simulated per-request latency
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Number of `register_module` calls that succeeded
    pub fn registration_count(&self) -> u64 {
        self.registrations.load(Ordering::SeqCst)
    }

    /// Whether a module is registered under `filename`
    pub fn is_module_registered(&self, filename: &str) -> bool {
        self.modules.read().contains_key(filename)
    }

    /// Number of live records across all nodes
    pub fn record_count(&self) -> usize {
        let now = self.now_store_secs();
        self.nodes
            .iter()
            .map(|node| node.records.read().values().filter(|r| r.is_live(now)).count())
            .sum()
    }

    /// Name of the node owning `address`
    pub fn node_of(&self, address: &RecordAddress) -> &str {
        &self.node_for(address).name
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn node_for(&self, address: &RecordAddress) -> &MemoryNode {
        let partition = address.digest() % PARTITION_COUNT;
        &self.nodes[partition as usize % self.nodes.len()]
    }

    fn now_store_secs(&self) -> u64 {
        unix_ms_to_store_secs(self.clock.now_unix_ms())
    }

    /// Account for one request: connectivity, then latency against timeout
    fn round_trip(&self, timeout: Option<Duration>) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(AdapterError::StoreUnavailable("no connection to cluster".to_string()));
        }

        let latency = *self.latency.lock();
        if latency.is_zero() {
            return Ok(());
        }
        match timeout {
            Some(limit) if latency > limit => {
                thread::sleep(limit);
                Err(AdapterError::Timeout(limit))
            }
            _ => {
                thread::sleep(latency);
                Ok(())
            }
        }
    }

    /// Absolute expiration for a write, given the record's current value
    fn expiration_for(&self, expiration: Expiration, current: Option<u32>) -> u32 {
        let now_ms = self.clock.now_unix_ms();
        match expiration {
            Expiration::Default if self.default_ttl == 0 => NEVER_EXPIRES,
            Expiration::Default => expiration_from_ttl(now_ms, self.default_ttl),
            Expiration::Seconds(secs) => expiration_from_ttl(now_ms, secs),
            Expiration::Never => NEVER_EXPIRES,
            Expiration::Unchanged => match current {
                Some(exp) => exp,
                None => self.expiration_for(Expiration::Default, None),
            },
        }
    }

    fn read_record(&self, address: &RecordAddress, bins: &[&str], now: u64) -> Option<Record> {
        let records = self.node_for(address).records.read();
        records
            .get(address)
            .filter(|r| r.is_live(now))
            .map(|r| r.project(bins))
    }

    fn check_precondition(exists: RecordExistsAction, present: bool) -> Result<()> {
        match exists {
            RecordExistsAction::UpdateOnly | RecordExistsAction::ReplaceOnly if !present => {
                Err(AdapterError::NotFound)
            }
            RecordExistsAction::CreateOnly if present => Err(AdapterError::AlreadyExists),
            _ => Ok(()),
        }
    }

    /// Store `bins` as the new content of `address`, or drop the record when
    /// no bins remain
    fn commit(
        &self,
        records: &mut HashMap<RecordAddress, StoredRecord>,
        address: &RecordAddress,
        previous: Option<&StoredRecord>,
        bins: HashMap<String, Value>,
        expiration: Expiration,
    ) -> Record {
        if bins.is_empty() {
            records.remove(address);
            return Record::default();
        }
        let stored = StoredRecord {
            bins,
            generation: previous.map(|r| r.generation + 1).unwrap_or(1),
            expiration: self.expiration_for(expiration, previous.map(|r| r.expiration)),
        };
        let header = stored.header();
        records.insert(address.clone(), stored);
        header
    }

    fn scan_node(
        &self,
        node: &MemoryNode,
        namespace: &str,
        set: &str,
        bins: &[&str],
        callback: &ScanCallback<'_>,
    ) -> Result<()> {
        let now = self.now_store_secs();
        // Snapshot first so callbacks never run under the node lock
        let snapshot: Vec<(RecordAddress, Record)> = {
            let records = node.records.read();
            records
                .iter()
                .filter(|(addr, rec)| addr.namespace == namespace && addr.set == set && rec.is_live(now))
                .map(|(addr, rec)| (addr.clone(), rec.project(bins)))
                .collect()
        };

        for (address, record) in &snapshot {
            callback(address, record)?;
        }
        Ok(())
    }

    fn sets_info(&self, node: &MemoryNode) -> String {
        let now = self.now_store_secs();
        let mut counts: BTreeMap<(String, String), u64> = BTreeMap::new();
        for (addr, rec) in node.records.read().iter() {
            if rec.is_live(now) {
                *counts
                    .entry((addr.namespace.clone(), addr.set.clone()))
                    .or_insert(0) += 1;
            }
        }

        counts
            .into_iter()
            .map(|((ns, set), n)| {
                format!(
                    "ns_name={}:set_name={}:n_objects={}:set-stop-write-count=0:set-delete=false;",
                    ns, set, n
                )
            })
            .collect()
    }

    fn udf_list_info(&self) -> String {
        self.modules
            .read()
            .iter()
            .map(|(filename, module)| {
                format!(
                    "filename={},hash={:08x},type={};",
                    filename,
                    module.hash,
                    module.language.as_str()
                )
            })
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Operate helpers
// =============================================================================

fn apply_add(bins: &mut HashMap<String, Value>, bin: &Bin) -> Result<()> {
    let delta = match &bin.value {
        Value::Int(delta) => *delta,
        other => {
            return Err(AdapterError::TypeMismatch(format!(
                "add requires an integer operand, got {}",
                other.type_name()
            )))
        }
    };

    let updated = match bins.get(&bin.name) {
        None | Some(Value::Nil) => delta,
        Some(Value::Int(current)) => current.checked_add(delta).ok_or_else(|| {
            AdapterError::InvalidArgument("increment or decrement would overflow".to_string())
        })?,
        Some(other) => {
            return Err(AdapterError::TypeMismatch(format!(
                "bin '{}' holds {}, not an integer",
                bin.name,
                other.type_name()
            )))
        }
    };
    bins.insert(bin.name.clone(), Value::Int(updated));
    Ok(())
}

fn apply_append(bins: &mut HashMap<String, Value>, bin: &Bin) -> Result<()> {
    let updated = match (bins.get(&bin.name), &bin.value) {
        (None, Value::Str(_)) | (None, Value::Blob(_)) | (Some(Value::Nil), _) => bin.value.clone(),
        (Some(Value::Str(current)), Value::Str(suffix)) => Value::Str(format!("{}{}", current, suffix)),
        // Numbers append to their decimal rendering and become strings
        (Some(Value::Int(current)), Value::Str(suffix)) => Value::Str(format!("{}{}", current, suffix)),
        (Some(Value::Float(current)), Value::Str(suffix)) => Value::Str(format!("{}{}", current, suffix)),
        (Some(Value::Blob(current)), Value::Blob(suffix)) => {
            let mut joined = current.to_vec();
            joined.extend_from_slice(suffix);
            Value::from(joined)
        }
        (current, suffix) => {
            return Err(AdapterError::TypeMismatch(format!(
                "cannot append {} to {}",
                suffix.type_name(),
                current.map(Value::type_name).unwrap_or("nothing")
            )))
        }
    };
    bins.insert(bin.name.clone(), updated);
    Ok(())
}

/// Drop bins whose collection became empty
fn prune_empty(bins: &mut HashMap<String, Value>) {
    bins.retain(|_, v| match v {
        Value::List(items) => !items.is_empty(),
        Value::Map(pairs) => !pairs.is_empty(),
        Value::Nil => false,
        _ => true,
    });
}

// =============================================================================
// RecordStore
// =============================================================================

impl RecordStore for MemoryStore {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn get(&self, policy: &ReadPolicy, address: &RecordAddress, bins: &[&str]) -> Result<Option<Record>> {
        self.round_trip(policy.timeout)?;
        Ok(self.read_record(address, bins, self.now_store_secs()))
    }

    fn get_header(&self, policy: &ReadPolicy, address: &RecordAddress) -> Result<Option<Record>> {
        self.round_trip(policy.timeout)?;
        let now = self.now_store_secs();
        let records = self.node_for(address).records.read();
        Ok(records
            .get(address)
            .filter(|r| r.is_live(now))
            .map(StoredRecord::header))
    }

    fn put(&self, policy: &WritePolicy, address: &RecordAddress, bins: &[Bin]) -> Result<()> {
        self.round_trip(policy.timeout)?;
        let now = self.now_store_secs();
        let mut records = self.node_for(address).records.write();

        let previous = records.get(address).filter(|r| r.is_live(now)).cloned();
        Self::check_precondition(policy.exists, previous.is_some())?;

        let mut content = match (policy.exists, &previous) {
            (RecordExistsAction::Update | RecordExistsAction::UpdateOnly, Some(prev)) => prev.bins.clone(),
            _ => HashMap::new(),
        };
        for bin in bins {
            if bin.value.is_nil() {
                content.remove(&bin.name);
            } else {
                content.insert(bin.name.clone(), bin.value.clone());
            }
        }

        self.commit(&mut records, address, previous.as_ref(), content, policy.expiration);
        Ok(())
    }

    fn delete(&self, policy: &WritePolicy, address: &RecordAddress) -> Result<bool> {
        self.round_trip(policy.timeout)?;
        let now = self.now_store_secs();
        let mut records = self.node_for(address).records.write();
        Ok(records.remove(address).map(|r| r.is_live(now)).unwrap_or(false))
    }

    fn exists(&self, policy: &ReadPolicy, address: &RecordAddress) -> Result<bool> {
        Ok(self.get_header(policy, address)?.is_some())
    }

    fn batch_get(
        &self,
        policy: &ReadPolicy,
        addresses: &[RecordAddress],
        bins: &[&str],
    ) -> Result<Vec<Option<Record>>> {
        self.round_trip(policy.timeout)?;
        let now = self.now_store_secs();
        Ok(addresses
            .iter()
            .map(|address| self.read_record(address, bins, now))
            .collect())
    }

    fn scan_all(
        &self,
        policy: &ScanPolicy,
        namespace: &str,
        set: &str,
        bins: &[&str],
        callback: &ScanCallback<'_>,
    ) -> Result<()> {
        self.round_trip(policy.timeout)?;

        if !policy.concurrent_nodes || self.nodes.len() == 1 {
            for node in &self.nodes {
                self.scan_node(node, namespace, set, bins, callback)?;
            }
            return Ok(());
        }

        let results = crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = self
                .nodes
                .iter()
                .map(|node| scope.spawn(move |_| self.scan_node(node, namespace, set, bins, callback)))
                .collect();
            handles
                .into_iter()
                .map(|h| {
                    h.join().unwrap_or_else(|_| {
                        Err(AdapterError::StoreUnavailable("scan worker panicked".to_string()))
                    })
                })
                .collect::<Vec<_>>()
        })
        .map_err(|_| AdapterError::StoreUnavailable("scan worker panicked".to_string()))?;

        results.into_iter().collect()
    }

    fn operate(&self, policy: &WritePolicy, address: &RecordAddress, operations: &[Operation]) -> Result<Record> {
        self.round_trip(policy.timeout)?;
        let now = self.now_store_secs();
        let mut records = self.node_for(address).records.write();

        let previous = records.get(address).filter(|r| r.is_live(now)).cloned();
        Self::check_precondition(policy.exists, previous.is_some())?;

        let writes = operations.iter().any(|op| !matches!(op, Operation::Get(_)));
        if !writes && previous.is_none() {
            return Err(AdapterError::NotFound);
        }

        // Work on a copy; nothing is stored unless every step succeeds
        let mut content = match (policy.exists, &previous) {
            (RecordExistsAction::Replace | RecordExistsAction::ReplaceOnly, _) | (_, None) => HashMap::new(),
            (_, Some(prev)) => prev.bins.clone(),
        };
        let mut result = HashMap::new();

        for op in operations {
            match op {
                Operation::Put(bin) => {
                    if bin.value.is_nil() {
                        content.remove(&bin.name);
                    } else {
                        content.insert(bin.name.clone(), bin.value.clone());
                    }
                }
                Operation::Add(bin) => apply_add(&mut content, bin)?,
                Operation::Append(bin) => apply_append(&mut content, bin)?,
                Operation::Get(name) => {
                    if let Some(value) = content.get(name) {
                        result.insert(name.clone(), value.clone());
                    }
                }
            }
        }

        let header = if writes {
            self.commit(&mut records, address, previous.as_ref(), content, policy.expiration)
        } else {
            previous.as_ref().map(StoredRecord::header).unwrap_or_default()
        };

        Ok(Record {
            bins: result,
            ..header
        })
    }

    fn touch(&self, policy: &WritePolicy, address: &RecordAddress) -> Result<()> {
        self.round_trip(policy.timeout)?;
        let now = self.now_store_secs();
        let mut records = self.node_for(address).records.write();

        let expiration = match records.get(address).filter(|r| r.is_live(now)) {
            Some(rec) => self.expiration_for(policy.expiration, Some(rec.expiration)),
            None => return Err(AdapterError::NotFound),
        };
        if let Some(rec) = records.get_mut(address) {
            rec.generation += 1;
            rec.expiration = expiration;
        }
        Ok(())
    }

    fn execute(
        &self,
        policy: &WritePolicy,
        address: &RecordAddress,
        module: &str,
        function: &str,
        args: &[Value],
    ) -> Result<Value> {
        self.round_trip(policy.timeout)?;

        let registered = self.modules.read().keys().any(|filename| module_name_of(filename) == module);
        if !registered {
            return Err(AdapterError::Procedure {
                module: module.to_string(),
                function: function.to_string(),
                message: format!("module '{}' is not registered", module),
            });
        }

        let now = self.now_store_secs();
        let mut records = self.node_for(address).records.write();
        let previous = records.get(address).filter(|r| r.is_live(now)).cloned();
        let mut content = previous.as_ref().map(|r| r.bins.clone()).unwrap_or_default();

        let reply = procedures::invoke(function, &mut content, args).map_err(|e| match e {
            ProcedureError::WrongType(message) => AdapterError::TypeMismatch(message),
            ProcedureError::Failed(message) => AdapterError::Procedure {
                module: module.to_string(),
                function: function.to_string(),
                message,
            },
        })?;

        prune_empty(&mut content);
        let changed = previous.as_ref().map(|r| r.bins != content).unwrap_or(!content.is_empty());
        if changed {
            self.commit(&mut records, address, previous.as_ref(), content, policy.expiration);
        }
        Ok(reply)
    }

    fn nodes(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.name.clone()).collect()
    }

    fn info(&self, policy: &InfoPolicy, node: &str, command: &str) -> Result<String> {
        self.round_trip(policy.timeout)?;
        let node = self
            .nodes
            .iter()
            .find(|n| n.name == node)
            .ok_or_else(|| AdapterError::StoreUnavailable(format!("unknown node {}", node)))?;

        Ok(match command {
            SETS_COMMAND => self.sets_info(node),
            UDF_LIST_COMMAND => self.udf_list_info(),
            _ => String::new(),
        })
    }

    fn register_module(
        &self,
        policy: &InfoPolicy,
        source: &[u8],
        server_path: &str,
        language: Language,
    ) -> Result<()> {
        self.round_trip(policy.timeout)?;
        if source.is_empty() {
            return Err(AdapterError::Registration(format!(
                "empty module body for {}",
                server_path
            )));
        }

        let hash = crc32fast::hash(source);
        self.modules
            .write()
            .insert(server_path.to_string(), RegisteredModule { hash, language });
        self.registrations.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Stored module {} ({} bytes, crc {:08x})", server_path, source.len(), hash);
        Ok(())
    }
}

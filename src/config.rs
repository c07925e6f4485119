//! Configuration for binkv
//!
//! Centralized configuration with sensible defaults. A `Config` is fixed for
//! the lifetime of an adapter; per-call policies are derived from it and
//! never mutated afterwards.

use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{AdapterError, Result};
use crate::store::module_name_of;

/// Maximum length of a bin name accepted by the store
pub const MAX_BIN_NAME_LEN: usize = 15;

/// Main configuration for an adapter instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Record Addressing
    // -------------------------------------------------------------------------
    /// Namespace every record lives in
    pub namespace: String,

    /// Set (collection) name every record lives in
    pub set: String,

    // -------------------------------------------------------------------------
    // Record Layout
    // -------------------------------------------------------------------------
    /// Bin holding the command value (scalars, lists, hashes)
    pub value_bin: String,

    /// Bin holding the original logical key, used by KEYS
    pub key_bin: String,

    // -------------------------------------------------------------------------
    // Procedure Module
    // -------------------------------------------------------------------------
    /// Server-side module implementing list/hash commands
    pub module: ProcedureModule,

    // -------------------------------------------------------------------------
    // Call Policy
    // -------------------------------------------------------------------------
    /// Per-call timeout (None = wait indefinitely)
    pub timeout: Option<Duration>,

    /// Scan all nodes in parallel for KEYS
    pub scan_concurrent_nodes: bool,
}

/// The remote procedure module the collection commands dispatch to
#[derive(Debug, Clone)]
pub struct ProcedureModule {
    /// Module name used when invoking procedures (e.g. `redis`)
    pub name: String,

    /// File name the module is registered under (e.g. `redis.lua`)
    pub filename: String,

    /// Where to read the module body from when it is not yet registered
    pub source: ModuleSource,
}

/// Source of the module body uploaded at registration time
#[derive(Debug, Clone)]
pub enum ModuleSource {
    /// Read from a file on local disk
    Path(PathBuf),

    /// Provided in memory
    Inline(Bytes),
}

impl ProcedureModule {
    /// Load the module body
    pub fn load_source(&self) -> Result<Bytes> {
        match &self.source {
            ModuleSource::Path(path) => {
                let body = std::fs::read(path).map_err(|e| {
                    AdapterError::Registration(format!(
                        "cannot read module source {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(Bytes::from(body))
            }
            ModuleSource::Inline(body) => Ok(body.clone()),
        }
    }
}

impl Default for ProcedureModule {
    fn default() -> Self {
        Self {
            name: "redis".to_string(),
            filename: "redis.lua".to_string(),
            source: ModuleSource::Path(PathBuf::from("udf/redis.lua")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: "test".to_string(),
            set: "redis".to_string(),
            value_bin: "redis-bin".to_string(),
            key_bin: "redis-key-bin".to_string(),
            module: ProcedureModule::default(),
            timeout: Some(Duration::from_millis(1000)),
            scan_concurrent_nodes: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the configuration against the store's naming limits
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(AdapterError::Config("namespace must not be empty".to_string()));
        }
        if self.set.is_empty() {
            return Err(AdapterError::Config("set must not be empty".to_string()));
        }
        for bin in [&self.value_bin, &self.key_bin] {
            if bin.is_empty() || bin.len() > MAX_BIN_NAME_LEN {
                return Err(AdapterError::Config(format!(
                    "bin name '{}' must be 1..={} bytes",
                    bin, MAX_BIN_NAME_LEN
                )));
            }
        }
        if self.value_bin == self.key_bin {
            return Err(AdapterError::Config(
                "value bin and key bin must differ".to_string(),
            ));
        }
        if self.module.name.is_empty() || self.module.filename.is_empty() {
            return Err(AdapterError::Config(
                "procedure module name and filename must be set".to_string(),
            ));
        }
        if module_name_of(&self.module.filename) != self.module.name {
            return Err(AdapterError::Config(format!(
                "procedure module file '{}' is invoked as '{}', not '{}'",
                self.module.filename,
                module_name_of(&self.module.filename),
                self.module.name
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Set the set (collection) name
    pub fn set(mut self, set: impl Into<String>) -> Self {
        self.config.set = set.into();
        self
    }

    /// Set the value bin name
    pub fn value_bin(mut self, bin: impl Into<String>) -> Self {
        self.config.value_bin = bin.into();
        self
    }

    /// Set the key bin name
    pub fn key_bin(mut self, bin: impl Into<String>) -> Self {
        self.config.key_bin = bin.into();
        self
    }

    /// Set the procedure module
    pub fn module(mut self, module: ProcedureModule) -> Self {
        self.config.module = module;
        self
    }

    /// Upload the module from memory instead of disk
    pub fn module_source_inline(mut self, body: impl Into<Bytes>) -> Self {
        self.config.module.source = ModuleSource::Inline(body.into());
        self
    }

    /// Set the per-call timeout (in milliseconds, 0 = no timeout)
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout = if ms == 0 {
            None
        } else {
            Some(Duration::from_millis(ms))
        };
        self
    }

    /// Scan nodes concurrently (true) or one after another (false)
    pub fn scan_concurrent_nodes(mut self, concurrent: bool) -> Self {
        self.config.scan_concurrent_nodes = concurrent;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

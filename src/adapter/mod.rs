//! Adapter Module
//!
//! The command surface. An [`Adapter`] owns a store handle and an immutable
//! [`Config`], and translates each command into store primitives.
//!
//! ## Routing
//! ```text
//!   command ──▶ resolve RecordAddress (namespace, set, key)
//!                   │
//!        ┌──────────┼─────────────────┬──────────────────────┐
//!        ▼          ▼                 ▼                      ▼
//!   get/put/del   operate          execute               touch / header /
//!   (strings,     (incr, append)   (list, hash,          info (expiry,
//!    keys)                          float counters)       admin)
//! ```
//!
//! ## Concurrency
//! The adapter holds no mutable state. Every call builds its own policy from
//! the config and performs independent blocking round trips, so one adapter
//! can be shared freely across threads. Atomicity is per record only:
//! `rename`, `mset`, `msetnx`, `del_many` and cross-key `rpoplpush` are
//! sequences of separate requests.

mod admin;
mod counters;
mod execute;
mod expiry;
mod hashes;
mod keys;
mod lists;
mod strings;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::mapping::RecordMapper;
use crate::policy::{Expiration, InfoPolicy, ReadPolicy, ScanPolicy, WritePolicy};
use crate::procedure::{FromReply, ProcedureCommand};
use crate::store::{RecordAddress, RecordStore};
use crate::ttl::{Clock, SystemClock};
use crate::value::Value;

/// Redis-style command adapter over a record store
pub struct Adapter<S: RecordStore> {
    /// Store handle (shared, safe for concurrent use)
    store: S,

    /// Adapter configuration (never mutated after construction)
    config: Config,

    /// Address and bin layout resolution
    mapper: RecordMapper,

    /// Time source for TTL arithmetic
    clock: Arc<dyn Clock>,
}

impl<S: RecordStore> Adapter<S> {
    /// Create an adapter using the system clock
    ///
    /// Validates the config and makes sure the procedure module is
    /// registered with the store; a registration failure is fatal.
    pub fn new(store: S, config: Config) -> Result<Self> {
        Self::with_clock(store, config, SystemClock)
    }

    /// Create an adapter with an explicit clock
    pub fn with_clock(store: S, config: Config, clock: impl Clock + 'static) -> Result<Self> {
        config.validate()?;

        let adapter = Self {
            mapper: RecordMapper::new(&config),
            store,
            config,
            clock: Arc::new(clock),
        };

        adapter.register_module_if_absent()?;

        tracing::debug!(
            "Adapter ready for {}.{} (module {})",
            adapter.config.namespace,
            adapter.config.set,
            adapter.config.module.filename
        );

        Ok(adapter)
    }

    // =========================================================================
    // Policies
    // =========================================================================

    fn read_policy(&self) -> ReadPolicy {
        ReadPolicy {
            timeout: self.config.timeout,
        }
    }

    fn write_policy(&self) -> WritePolicy {
        WritePolicy::new(self.config.timeout)
    }

    fn scan_policy(&self) -> ScanPolicy {
        ScanPolicy {
            timeout: self.config.timeout,
            concurrent_nodes: self.config.scan_concurrent_nodes,
        }
    }

    fn info_policy(&self) -> InfoPolicy {
        InfoPolicy {
            timeout: self.config.timeout,
        }
    }

    // =========================================================================
    // Procedure Dispatch
    // =========================================================================

    /// Invoke a module procedure against one record and decode its reply
    ///
    /// The value bin name is always passed as the first argument. Procedure
    /// calls keep the record's current TTL.
    fn call<T: FromReply>(
        &self,
        command: ProcedureCommand,
        address: &RecordAddress,
        args: Vec<Value>,
    ) -> Result<T> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(Value::from(self.mapper.value_bin()));
        full.extend(args);

        tracing::trace!("Dispatching {} on {}", command, address.key);

        let policy = self.write_policy().with_expiration(Expiration::Unchanged);
        let reply = self.store.execute(
            &policy,
            address,
            &self.config.module.name,
            command.name(),
            &full,
        )?;
        T::from_reply(command, reply)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the record mapper
    pub fn mapper(&self) -> &RecordMapper {
        &self.mapper
    }
}

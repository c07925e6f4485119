//! Record mapping
//!
//! Every command targets exactly one record, addressed by the adapter's
//! namespace and set plus the converted logical key. Scalar commands use a
//! fixed two-bin layout:
//!
//! ```text
//! ┌──────────────────────────┬──────────────────────────┐
//! │ key bin (redis-key-bin)  │ value bin (redis-bin)    │
//! │ original logical key     │ string / integer / float │
//! └──────────────────────────┴──────────────────────────┘
//! ```
//!
//! The key bin exists only so a set scan can recover logical keys for
//! `KEYS`; it is always written together with the value.

use crate::config::Config;
use crate::error::Result;
use crate::store::{Bin, RecordAddress};
use crate::value::{Key, ToKey, Value};

/// Resolves addresses and builds record layouts for one adapter
#[derive(Debug, Clone)]
pub struct RecordMapper {
    namespace: String,
    set: String,
    key_bin: String,
    value_bin: String,
}

impl RecordMapper {
    pub fn new(config: &Config) -> Self {
        Self {
            namespace: config.namespace.clone(),
            set: config.set.clone(),
            key_bin: config.key_bin.clone(),
            value_bin: config.value_bin.clone(),
        }
    }

    /// Deterministic address of the record backing `key`
    pub fn resolve_address<K: ToKey>(&self, key: K) -> Result<RecordAddress> {
        Ok(self.address_of(key.to_key()?))
    }

    /// Address of an already converted key
    pub fn address_of(&self, key: Key) -> RecordAddress {
        RecordAddress::new(self.namespace.clone(), self.set.clone(), key)
    }

    /// Resolve a batch of keys, preserving order
    pub fn resolve_all<K: ToKey>(&self, keys: &[K]) -> Result<Vec<RecordAddress>> {
        keys.iter().map(|k| self.resolve_address(k)).collect()
    }

    /// Both bins of a scalar record
    pub fn scalar_bins(&self, key: &Key, value: Value) -> [Bin; 2] {
        [self.key_bin_for(key), Bin::new(self.value_bin.clone(), value)]
    }

    /// The key bin for `key`
    pub fn key_bin_for(&self, key: &Key) -> Bin {
        Bin::new(self.key_bin.clone(), Value::from(key.clone()))
    }

    /// A value bin holding `value`
    pub fn value_bin_with(&self, value: impl Into<Value>) -> Bin {
        Bin::new(self.value_bin.clone(), value)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn set(&self) -> &str {
        &self.set
    }

    pub fn key_bin(&self) -> &str {
        &self.key_bin
    }

    pub fn value_bin(&self) -> &str {
        &self.value_bin
    }
}

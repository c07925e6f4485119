//! Key-space commands
//!
//! Deletion, existence, batch reads, enumeration and rename.

use std::collections::HashSet;

use parking_lot::Mutex;
use regex::bytes::Regex as BytesRegex;
use regex::Regex;

use crate::error::{AdapterError, Result};
use crate::procedure::Status;
use crate::store::{Record, RecordAddress, RecordStore};
use crate::value::{ToKey, Value};

use super::Adapter;

impl<S: RecordStore> Adapter<S> {
    /// DEL: remove one key; `true` if a record was removed
    pub fn del<K: ToKey>(&self, key: K) -> Result<bool> {
        let address = self.mapper.resolve_address(key)?;
        self.store.delete(&self.write_policy(), &address)
    }

    /// DEL key [key ...]: remove each key in turn
    ///
    /// Returns the number of keys attempted, whether or not they existed.
    /// Not atomic: a failure leaves earlier keys deleted.
    pub fn del_many<K: ToKey>(&self, keys: &[K]) -> Result<u64> {
        let policy = self.write_policy();
        let mut count = 0;
        for key in keys {
            let address = self.mapper.resolve_address(key)?;
            self.store.delete(&policy, &address)?;
            count += 1;
        }
        Ok(count)
    }

    /// EXISTS
    pub fn exists<K: ToKey>(&self, key: K) -> Result<bool> {
        let address = self.mapper.resolve_address(key)?;
        self.store.exists(&self.read_policy(), &address)
    }

    /// MGET: one batch read, same order and length as `keys`
    pub fn mget<K: ToKey>(&self, keys: &[K]) -> Result<Vec<Option<Value>>> {
        let addresses = self.mapper.resolve_all(keys)?;
        let value_bin = self.mapper.value_bin();
        let records = self.store.batch_get(&self.read_policy(), &addresses, &[value_bin])?;
        Ok(records
            .into_iter()
            .map(|record| record.and_then(|mut r| r.take_bin(value_bin)))
            .collect())
    }

    /// KEYS: logical keys whose text fully matches the regular expression
    ///
    /// Scans the whole set reading only the key bin, so the cost is
    /// proportional to the number of records. Records written without a
    /// key bin (lists, hashes) are never returned.
    pub fn keys(&self, pattern: &str) -> Result<HashSet<String>> {
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;
        let matches = Mutex::new(HashSet::new());

        self.scan_key_bins(|key| {
            if let Some(text) = key.scalar_string() {
                if regex.is_match(&text) {
                    matches.lock().insert(text);
                }
            }
        })?;

        Ok(matches.into_inner())
    }

    /// KEYS over raw key bytes
    pub fn keys_binary(&self, pattern: &[u8]) -> Result<HashSet<Vec<u8>>> {
        let pattern = std::str::from_utf8(pattern)
            .map_err(|e| AdapterError::InvalidArgument(format!("pattern is not UTF-8: {}", e)))?;
        let regex = BytesRegex::new(&format!("^(?:{})$", pattern))?;
        let matches = Mutex::new(HashSet::new());

        self.scan_key_bins(|key| {
            let bytes = match key {
                Value::Blob(b) => b.to_vec(),
                Value::Str(s) => s.as_bytes().to_vec(),
                Value::Int(i) => i.to_string().into_bytes(),
                _ => return,
            };
            if regex.is_match(&bytes) {
                matches.lock().insert(bytes);
            }
        })?;

        Ok(matches.into_inner())
    }

    /// RENAME: copy the value to `new_key`, then delete `old_key`
    ///
    /// Fails with `NotFound` if `old_key` does not exist. Two separate
    /// writes: a failure between them leaves both keys present. The TTL of
    /// the old key is not carried over.
    pub fn rename<K: ToKey, N: ToKey>(&self, old_key: K, new_key: N) -> Result<Status> {
        let old_address = self.mapper.resolve_address(old_key)?;
        let new_key = new_key.to_key()?;
        let value_bin = self.mapper.value_bin();

        let value = self
            .store
            .get(&self.read_policy(), &old_address, &[value_bin])?
            .and_then(|mut r| r.take_bin(value_bin))
            .ok_or(AdapterError::NotFound)?;

        if old_address.key == new_key {
            return Ok(Status::ok());
        }

        self.set(new_key, value)?;
        self.store.delete(&self.write_policy(), &old_address)?;
        Ok(Status::ok())
    }

    /// Scan the set passing each record's key bin to `visit`
    fn scan_key_bins<F>(&self, visit: F) -> Result<()>
    where
        F: Fn(&Value) + Sync,
    {
        let key_bin = self.mapper.key_bin();
        self.store.scan_all(
            &self.scan_policy(),
            self.mapper.namespace(),
            self.mapper.set(),
            &[key_bin],
            &|_address: &RecordAddress, record: &Record| {
                if let Some(key) = record.bin(key_bin) {
                    visit(key);
                }
                Ok(())
            },
        )
    }
}

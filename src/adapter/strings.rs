//! String commands
//!
//! Plain reads and writes of the two-bin scalar record, and the conditional
//! writes built on existence preconditions.

use crate::error::{AdapterError, Result};
use crate::policy::{Expiration, RecordExistsAction, WritePolicy};
use crate::procedure::{ProcedureCommand, Status};
use crate::store::RecordStore;
use crate::ttl::millis_to_ttl_secs;
use crate::value::{ToKey, Value};

use super::Adapter;

impl<S: RecordStore> Adapter<S> {
    /// GET: read the value bin; `None` when the key does not exist
    pub fn get<K: ToKey>(&self, key: K) -> Result<Option<Value>> {
        let address = self.mapper.resolve_address(key)?;
        let value_bin = self.mapper.value_bin();
        let record = self.store.get(&self.read_policy(), &address, &[value_bin])?;
        Ok(record.and_then(|mut r| r.take_bin(value_bin)))
    }

    /// GET, rendered as a string
    ///
    /// Fails with `TypeMismatch` when the key holds a list or hash.
    pub fn get_string<K: ToKey>(&self, key: K) -> Result<Option<String>> {
        match self.get(key)? {
            None => Ok(None),
            Some(value) => value.scalar_string().map(Some).ok_or_else(|| {
                AdapterError::TypeMismatch(format!("key holds a {}, not a string", value.type_name()))
            }),
        }
    }

    /// SET: create or fully replace the record
    pub fn set<K: ToKey, V: Into<Value>>(&self, key: K, value: V) -> Result<Status> {
        let policy = self.write_policy().with_exists(RecordExistsAction::Replace);
        self.set_with(policy, key, value)
    }

    /// SET under an explicit policy (existence precondition, TTL, timeout)
    ///
    /// Both bins are always written, so the record is replaced or created as
    /// a whole.
    pub fn set_with<K: ToKey, V: Into<Value>>(&self, policy: WritePolicy, key: K, value: V) -> Result<Status> {
        let value = value.into();
        if value.is_nil() {
            return Err(AdapterError::InvalidArgument("cannot store a nil value".to_string()));
        }

        let key = key.to_key()?;
        let address = self.mapper.address_of(key.clone());
        let bins = self.mapper.scalar_bins(&key, value);
        self.store.put(&policy, &address, &bins)?;
        Ok(Status::ok())
    }

    /// MSET: SET each pair in order
    ///
    /// Not atomic: a failure leaves the earlier pairs written.
    pub fn mset<K, V>(&self, pairs: &[(K, V)]) -> Result<Status>
    where
        K: ToKey,
        V: Clone + Into<Value>,
    {
        for (key, value) in pairs {
            self.set(key, value.clone())?;
        }
        Ok(Status::ok())
    }

    /// SETNX: write only if the key does not exist; 1 if written, else 0
    pub fn setnx<K: ToKey, V: Into<Value>>(&self, key: K, value: V) -> Result<i64> {
        let policy = self.write_policy().with_exists(RecordExistsAction::CreateOnly);
        match self.set_with(policy, key, value) {
            Ok(_) => Ok(1),
            Err(AdapterError::AlreadyExists) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// SET XX: write only if the key exists; 1 if written, else 0
    pub fn setxx<K: ToKey, V: Into<Value>>(&self, key: K, value: V) -> Result<i64> {
        let policy = self.write_policy().with_exists(RecordExistsAction::ReplaceOnly);
        match self.set_with(policy, key, value) {
            Ok(_) => Ok(1),
            Err(AdapterError::NotFound) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// MSETNX: SETNX each pair, returning how many were written
    ///
    /// A pair whose key already exists is skipped. Any other failure aborts
    /// the remaining pairs; pairs already written stay written.
    pub fn msetnx<K, V>(&self, pairs: &[(K, V)]) -> Result<u64>
    where
        K: ToKey,
        V: Clone + Into<Value>,
    {
        let mut written = 0;
        for (key, value) in pairs {
            match self.setnx(key, value.clone()) {
                Ok(n) => written += n as u64,
                Err(e) => {
                    tracing::warn!("MSETNX aborted after {} of {} pairs: {}", written, pairs.len(), e);
                    return Err(e);
                }
            }
        }
        Ok(written)
    }

    /// SETEX: SET with a TTL in seconds
    pub fn setex<K: ToKey, V: Into<Value>>(&self, key: K, seconds: i64, value: V) -> Result<Status> {
        if seconds <= 0 {
            return Err(AdapterError::InvalidArgument(
                "invalid expire time in 'setex' command".to_string(),
            ));
        }
        let secs = u32::try_from(seconds).map_err(|_| {
            AdapterError::InvalidArgument(format!("expire time {} out of range", seconds))
        })?;

        let policy = self
            .write_policy()
            .with_exists(RecordExistsAction::Replace)
            .with_expiration(Expiration::Seconds(secs));
        self.set_with(policy, key, value)
    }

    /// PSETEX: SET with a TTL in milliseconds, rounded up to whole seconds
    pub fn psetex<K: ToKey, V: Into<Value>>(&self, key: K, millis: i64, value: V) -> Result<Status> {
        if millis <= 0 {
            return Err(AdapterError::InvalidArgument(
                "invalid expire time in 'psetex' command".to_string(),
            ));
        }
        self.setex(key, millis_to_ttl_secs(millis), value)
    }

    /// GETSET: store a new value and return the previous one
    pub fn getset<K: ToKey, V: Into<Value>>(&self, key: K, value: V) -> Result<Option<Value>> {
        let address = self.mapper.resolve_address(key)?;
        let key_bin = self.mapper.key_bin_for(&address.key);
        self.call(
            ProcedureCommand::GetSet,
            &address,
            vec![value.into(), Value::from(key_bin.name), key_bin.value],
        )
    }

    /// STRLEN: byte length of the stored string, 0 when absent
    pub fn strlen<K: ToKey>(&self, key: K) -> Result<usize> {
        Ok(self.get_string(key)?.map(|s| s.len()).unwrap_or(0))
    }

    /// GETRANGE: inclusive byte range, negative offsets count from the end
    pub fn getrange<K: ToKey>(&self, key: K, start: i64, end: i64) -> Result<String> {
        let value = self.get_string(key)?.unwrap_or_default();
        Ok(byte_range(&value, start, end))
    }

    /// SUBSTR: alias of GETRANGE
    pub fn substr<K: ToKey>(&self, key: K, start: i64, end: i64) -> Result<String> {
        self.getrange(key, start, end)
    }
}

fn byte_range(value: &str, start: i64, end: i64) -> String {
    let len = value.len() as i64;
    if len == 0 {
        return String::new();
    }
    let start = if start < 0 { (len + start).max(0) } else { start };
    let end = if end < 0 { (len + end).max(0) } else { end.min(len - 1) };
    if start > end {
        return String::new();
    }
    String::from_utf8_lossy(&value.as_bytes()[start as usize..=end as usize]).into_owned()
}

//! Counter and append commands
//!
//! Each command is one `operate` request against a single record:
//!
//! ```text
//! INCRBY:  put(key bin) → add(value bin, delta)     → get(value bin)
//! APPEND:  put(key bin) → append(value bin, suffix) → get(value bin)
//! ```
//!
//! The store executes the steps atomically and returns the final value; the
//! adapter never re-reads. Existence policy is update-or-create, so an
//! absent key starts from the operand itself. The record's TTL is kept.

use crate::error::{AdapterError, Result};
use crate::policy::{Expiration, RecordExistsAction};
use crate::procedure::ProcedureCommand;
use crate::store::{Operation, Record, RecordStore};
use crate::value::{ToKey, Value};

use super::Adapter;

impl<S: RecordStore> Adapter<S> {
    /// INCR: add 1
    pub fn incr<K: ToKey>(&self, key: K) -> Result<i64> {
        self.incr_by(key, 1)
    }

    /// INCRBY: add `delta` (may be negative), returning the new value
    ///
    /// Fails with `TypeMismatch` when the stored value is not an integer.
    pub fn incr_by<K: ToKey>(&self, key: K, delta: i64) -> Result<i64> {
        let record = self.operate_value(key, Operation::Add(self.mapper.value_bin_with(delta)))?;
        match record {
            Some(Value::Int(n)) => Ok(n),
            other => Err(AdapterError::mismatch(
                "INCRBY",
                "integer",
                other.as_ref().map(Value::type_name).unwrap_or("nil"),
            )),
        }
    }

    /// DECR: subtract 1
    pub fn decr<K: ToKey>(&self, key: K) -> Result<i64> {
        self.incr_by(key, -1)
    }

    /// DECRBY: subtract `delta`
    pub fn decr_by<K: ToKey>(&self, key: K, delta: i64) -> Result<i64> {
        let negated = delta.checked_neg().ok_or_else(|| {
            AdapterError::InvalidArgument("decrement would overflow".to_string())
        })?;
        self.incr_by(key, negated)
    }

    /// INCRBYFLOAT: floating-point add, executed by the procedure module
    /// since the native add only handles integers
    pub fn incr_by_float<K: ToKey>(&self, key: K, delta: f64) -> Result<f64> {
        if !delta.is_finite() {
            return Err(AdapterError::InvalidArgument(
                "increment would produce NaN or Infinity".to_string(),
            ));
        }
        let address = self.mapper.resolve_address(key)?;
        let key_bin = self.mapper.key_bin_for(&address.key);
        self.call(
            ProcedureCommand::IncrByFloat,
            &address,
            vec![Value::Float(delta), Value::from(key_bin.name), key_bin.value],
        )
    }

    /// APPEND: append to the stored string, returning its new byte length
    pub fn append<K: ToKey>(&self, key: K, suffix: &str) -> Result<usize> {
        let record = self.operate_value(key, Operation::Append(self.mapper.value_bin_with(suffix)))?;
        match record {
            Some(Value::Str(s)) => Ok(s.len()),
            other => Err(AdapterError::mismatch(
                "APPEND",
                "string",
                other.as_ref().map(Value::type_name).unwrap_or("nil"),
            )),
        }
    }

    /// Run `put(key bin) → step → get(value bin)` and return the value bin
    fn operate_value<K: ToKey>(&self, key: K, step: Operation) -> Result<Option<Value>> {
        let key = key.to_key()?;
        let address = self.mapper.address_of(key.clone());
        let operations = [
            Operation::Put(self.mapper.key_bin_for(&key)),
            step,
            Operation::Get(self.mapper.value_bin().to_string()),
        ];

        let policy = self
            .write_policy()
            .with_exists(RecordExistsAction::Update)
            .with_expiration(Expiration::Unchanged);
        let mut record: Record = self.store.operate(&policy, &address, &operations)?;
        Ok(record.take_bin(self.mapper.value_bin()))
    }
}

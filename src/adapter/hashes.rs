//! Hash commands
//!
//! A hash is a single map-valued bin; every command is one module
//! procedure call against the record.

use std::collections::{HashMap, HashSet};

use crate::error::{AdapterError, Result};
use crate::procedure::{ProcedureCommand, Status};
use crate::store::RecordStore;
use crate::value::{ToKey, Value};

use super::Adapter;

impl<S: RecordStore> Adapter<S> {
    /// HSET: 1 if the field was created, 0 if it was overwritten
    pub fn hset<K: ToKey, V: Into<Value>>(&self, key: K, field: &str, value: V) -> Result<i64> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::HSet, &address, vec![Value::from(field), value.into()])
    }

    /// HSETNX: set only if the field is absent; 1 if set, else 0
    pub fn hsetnx<K: ToKey, V: Into<Value>>(&self, key: K, field: &str, value: V) -> Result<i64> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::HSetNx, &address, vec![Value::from(field), value.into()])
    }

    /// HGET
    pub fn hget<K: ToKey>(&self, key: K, field: &str) -> Result<Option<String>> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::HGet, &address, vec![Value::from(field)])
    }

    /// HMSET: set several fields in one call
    pub fn hmset<K, F, V>(&self, key: K, entries: &[(F, V)]) -> Result<Status>
    where
        K: ToKey,
        F: AsRef<str>,
        V: Clone + Into<Value>,
    {
        if entries.is_empty() {
            return Err(AdapterError::InvalidArgument(
                "wrong number of arguments for 'hmset' command".to_string(),
            ));
        }
        let address = self.mapper.resolve_address(key)?;
        let map = entries
            .iter()
            .map(|(field, value)| (Value::from(field.as_ref()), value.clone().into()))
            .collect();
        self.call(ProcedureCommand::HMSet, &address, vec![Value::Map(map)])
    }

    /// HMGET: one entry per requested field, in order
    pub fn hmget<K: ToKey, F: AsRef<str>>(&self, key: K, fields: &[F]) -> Result<Vec<Option<String>>> {
        let address = self.mapper.resolve_address(key)?;
        let fields = fields.iter().map(|f| Value::from(f.as_ref())).collect();
        self.call(ProcedureCommand::HMGet, &address, vec![Value::List(fields)])
    }

    /// HINCRBY: integer add on a field, returning the new value
    pub fn hincr_by<K: ToKey>(&self, key: K, field: &str, delta: i64) -> Result<i64> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::HIncrBy, &address, vec![Value::from(field), Value::Int(delta)])
    }

    /// HINCRBYFLOAT: floating-point add on a field
    pub fn hincr_by_float<K: ToKey>(&self, key: K, field: &str, delta: f64) -> Result<f64> {
        if !delta.is_finite() {
            return Err(AdapterError::InvalidArgument(
                "increment would produce NaN or Infinity".to_string(),
            ));
        }
        let address = self.mapper.resolve_address(key)?;
        self.call(
            ProcedureCommand::HIncrByFloat,
            &address,
            vec![Value::from(field), Value::Float(delta)],
        )
    }

    /// HEXISTS
    pub fn hexists<K: ToKey>(&self, key: K, field: &str) -> Result<bool> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::HExists, &address, vec![Value::from(field)])
    }

    /// HDEL: number of fields removed
    pub fn hdel<K: ToKey>(&self, key: K, field: &str) -> Result<i64> {
        self.hdel_many(key, &[field])
    }

    /// HDEL key field [field ...]
    pub fn hdel_many<K: ToKey, F: AsRef<str>>(&self, key: K, fields: &[F]) -> Result<i64> {
        let address = self.mapper.resolve_address(key)?;
        let fields = fields.iter().map(|f| Value::from(f.as_ref())).collect();
        self.call(ProcedureCommand::HDel, &address, fields)
    }

    /// HLEN: 0 when the key does not exist
    pub fn hlen<K: ToKey>(&self, key: K) -> Result<i64> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::HLen, &address, Vec::new())
    }

    pub fn hkeys<K: ToKey>(&self, key: K) -> Result<HashSet<String>> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::HKeys, &address, Vec::new())
    }

    pub fn hvals<K: ToKey>(&self, key: K) -> Result<Vec<String>> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::HVals, &address, Vec::new())
    }

    pub fn hgetall<K: ToKey>(&self, key: K) -> Result<HashMap<String, String>> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::HGetAll, &address, Vec::new())
    }
}

//! List commands
//!
//! Lists live as a single list-valued bin and every command runs as a
//! module procedure, so each one is atomic for its record. Indexes follow
//! the usual convention: 0 is the head, -1 the tail.

use crate::error::Result;
use crate::procedure::{ListPosition, ProcedureCommand, Status};
use crate::store::RecordStore;
use crate::value::{ToKey, Value};

use super::Adapter;

impl<S: RecordStore> Adapter<S> {
    /// RPUSH: append to the tail, creating the list; returns the new length
    pub fn rpush<K: ToKey, V: Into<Value>>(&self, key: K, value: V) -> Result<i64> {
        self.push(ProcedureCommand::RPush, key, vec![value.into()])
    }

    /// LPUSH: prepend to the head, creating the list; returns the new length
    pub fn lpush<K: ToKey, V: Into<Value>>(&self, key: K, value: V) -> Result<i64> {
        self.push(ProcedureCommand::LPush, key, vec![value.into()])
    }

    /// RPUSH key value [value ...]
    pub fn rpush_all<K: ToKey, V: Clone + Into<Value>>(&self, key: K, values: &[V]) -> Result<i64> {
        self.push(ProcedureCommand::RPush, key, values.iter().cloned().map(Into::into).collect())
    }

    /// LPUSH key value [value ...]; the last value ends up at the head
    pub fn lpush_all<K: ToKey, V: Clone + Into<Value>>(&self, key: K, values: &[V]) -> Result<i64> {
        self.push(ProcedureCommand::LPush, key, values.iter().cloned().map(Into::into).collect())
    }

    /// RPUSHX: RPUSH only if the list exists; 0 otherwise
    pub fn rpushx<K: ToKey, V: Into<Value>>(&self, key: K, value: V) -> Result<i64> {
        self.push(ProcedureCommand::RPushX, key, vec![value.into()])
    }

    /// LPUSHX: LPUSH only if the list exists; 0 otherwise
    pub fn lpushx<K: ToKey, V: Into<Value>>(&self, key: K, value: V) -> Result<i64> {
        self.push(ProcedureCommand::LPushX, key, vec![value.into()])
    }

    /// LLEN: 0 when the key does not exist
    pub fn llen<K: ToKey>(&self, key: K) -> Result<i64> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::LLen, &address, Vec::new())
    }

    /// LRANGE: inclusive range of elements
    pub fn lrange<K: ToKey>(&self, key: K, start: i64, stop: i64) -> Result<Vec<String>> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::LRange, &address, vec![Value::Int(start), Value::Int(stop)])
    }

    /// LTRIM: keep only the inclusive range
    pub fn ltrim<K: ToKey>(&self, key: K, start: i64, stop: i64) -> Result<Status> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::LTrim, &address, vec![Value::Int(start), Value::Int(stop)])
    }

    /// LSET: overwrite the element at `index`
    ///
    /// Fails with a `Procedure` error when the index is out of range or the
    /// key does not exist.
    pub fn lset<K: ToKey, V: Into<Value>>(&self, key: K, index: i64, value: V) -> Result<Status> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::LSet, &address, vec![Value::Int(index), value.into()])
    }

    /// LINDEX: element at `index`, `None` when out of range
    pub fn lindex<K: ToKey>(&self, key: K, index: i64) -> Result<Option<String>> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::LIndex, &address, vec![Value::Int(index)])
    }

    /// LREM: remove up to `count` occurrences of `value`
    ///
    /// Positive counts scan from the head, negative from the tail, 0 removes
    /// all. Returns the number removed.
    pub fn lrem<K: ToKey, V: Into<Value>>(&self, key: K, count: i64, value: V) -> Result<i64> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::LRem, &address, vec![Value::Int(count), value.into()])
    }

    /// LPOP: remove and return the head
    pub fn lpop<K: ToKey>(&self, key: K) -> Result<Option<String>> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::LPop, &address, vec![Value::Int(1)])
    }

    /// RPOP: remove and return the tail
    pub fn rpop<K: ToKey>(&self, key: K) -> Result<Option<String>> {
        let address = self.mapper.resolve_address(key)?;
        self.call(ProcedureCommand::RPop, &address, vec![Value::Int(1)])
    }

    /// RPOPLPUSH: pop the tail of `source` and push it onto `destination`
    ///
    /// The pop is one procedure call on `source`. When `destination` is the
    /// same record the call is told to rotate the element in place; otherwise
    /// the push is a second request, and a failure there loses the element.
    pub fn rpoplpush<K: ToKey, D: ToKey>(&self, source: K, destination: D) -> Result<Option<String>> {
        let source = self.mapper.resolve_address(source)?;
        let destination = self.mapper.resolve_address(destination)?;

        let rotate = destination == source;

        let popped: Option<String> = self.call(ProcedureCommand::RPopLPush, &source, vec![Value::Bool(rotate)])?;

        if let Some(element) = &popped {
            if !rotate {
                self.call::<i64>(ProcedureCommand::LPush, &destination, vec![Value::from(element.as_str())])?;
            }
        }
        Ok(popped)
    }

    /// LINSERT: insert `value` before or after the first `pivot`
    ///
    /// Returns the new length, -1 when the pivot is missing, 0 when the key
    /// does not exist.
    pub fn linsert<K, P, V>(&self, key: K, position: ListPosition, pivot: P, value: V) -> Result<i64>
    where
        K: ToKey,
        P: Into<Value>,
        V: Into<Value>,
    {
        let address = self.mapper.resolve_address(key)?;
        self.call(
            ProcedureCommand::LInsert,
            &address,
            vec![position.into(), pivot.into(), value.into()],
        )
    }

    fn push<K: ToKey>(&self, command: ProcedureCommand, key: K, values: Vec<Value>) -> Result<i64> {
        let address = self.mapper.resolve_address(key)?;
        self.call(command, &address, values)
    }
}

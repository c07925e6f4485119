//! Collection dispatch
//!
//! List and hash commands run as named procedures of one server-side module.
//! Every call passes the value bin name first, then the command's positional
//! arguments. Replies are dynamically typed on the wire; [`FromReply`] is the
//! explicit decode step that turns them into the command's result type and
//! fails with `ProtocolMismatch` on any other shape.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{AdapterError, Result};
use crate::value::Value;

// =============================================================================
// Commands
// =============================================================================

/// Procedures exposed by the collection module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcedureCommand {
    // Lists
    RPush,
    LPush,
    LLen,
    LRange,
    LTrim,
    LSet,
    LIndex,
    LRem,
    LPop,
    RPop,
    RPopLPush,
    LPushX,
    RPushX,
    LInsert,

    // Hashes
    HSet,
    HGet,
    HSetNx,
    HMSet,
    HMGet,
    HIncrBy,
    HExists,
    HDel,
    HLen,
    HKeys,
    HVals,
    HGetAll,
    HIncrByFloat,

    // Scalars without a native primitive
    IncrByFloat,
    GetSet,
}

impl ProcedureCommand {
    /// Every procedure the module must provide
    pub const ALL: [ProcedureCommand; 29] = [
        ProcedureCommand::RPush,
        ProcedureCommand::LPush,
        ProcedureCommand::LLen,
        ProcedureCommand::LRange,
        ProcedureCommand::LTrim,
        ProcedureCommand::LSet,
        ProcedureCommand::LIndex,
        ProcedureCommand::LRem,
        ProcedureCommand::LPop,
        ProcedureCommand::RPop,
        ProcedureCommand::RPopLPush,
        ProcedureCommand::LPushX,
        ProcedureCommand::RPushX,
        ProcedureCommand::LInsert,
        ProcedureCommand::HSet,
        ProcedureCommand::HGet,
        ProcedureCommand::HSetNx,
        ProcedureCommand::HMSet,
        ProcedureCommand::HMGet,
        ProcedureCommand::HIncrBy,
        ProcedureCommand::HExists,
        ProcedureCommand::HDel,
        ProcedureCommand::HLen,
        ProcedureCommand::HKeys,
        ProcedureCommand::HVals,
        ProcedureCommand::HGetAll,
        ProcedureCommand::HIncrByFloat,
        ProcedureCommand::IncrByFloat,
        ProcedureCommand::GetSet,
    ];

    /// Function name inside the module
    pub fn name(&self) -> &'static str {
        match self {
            ProcedureCommand::RPush => "RPUSH",
            ProcedureCommand::LPush => "LPUSH",
            ProcedureCommand::LLen => "LLEN",
            ProcedureCommand::LRange => "LRANGE",
            ProcedureCommand::LTrim => "LTRIM",
            ProcedureCommand::LSet => "LSET",
            ProcedureCommand::LIndex => "LINDEX",
            ProcedureCommand::LRem => "LREM",
            ProcedureCommand::LPop => "LPOP",
            ProcedureCommand::RPop => "RPOP",
            ProcedureCommand::RPopLPush => "RPOPLPUSH",
            ProcedureCommand::LPushX => "LPUSHX",
            ProcedureCommand::RPushX => "RPUSHX",
            ProcedureCommand::LInsert => "LINSERT",
            ProcedureCommand::HSet => "HSET",
            ProcedureCommand::HGet => "HGET",
            ProcedureCommand::HSetNx => "HSETNX",
            ProcedureCommand::HMSet => "HMSET",
            ProcedureCommand::HMGet => "HMGET",
            ProcedureCommand::HIncrBy => "HINCRBY",
            ProcedureCommand::HExists => "HEXISTS",
            ProcedureCommand::HDel => "HDEL",
            ProcedureCommand::HLen => "HLEN",
            ProcedureCommand::HKeys => "HKEYS",
            ProcedureCommand::HVals => "HVALS",
            ProcedureCommand::HGetAll => "HGETALL",
            ProcedureCommand::HIncrByFloat => "HINCRBYFLOAT",
            ProcedureCommand::IncrByFloat => "INCRBYFLOAT",
            ProcedureCommand::GetSet => "GETSET",
        }
    }
}

impl fmt::Display for ProcedureCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where LINSERT places the new element relative to the pivot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPosition {
    Before,
    After,
}

impl ListPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListPosition::Before => "BEFORE",
            ListPosition::After => "AFTER",
        }
    }
}

impl From<ListPosition> for Value {
    fn from(position: ListPosition) -> Self {
        Value::from(position.as_str())
    }
}

/// Simple status reply (`OK`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status(pub String);

impl Status {
    pub fn ok() -> Self {
        Status("OK".to_string())
    }

    pub fn is_ok(&self) -> bool {
        self.0 == "OK"
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Reply decoding
// =============================================================================

/// Decode a procedure reply into a typed result
pub trait FromReply: Sized {
    /// Shape name used in `ProtocolMismatch` errors
    const EXPECTED: &'static str;

    fn from_reply(command: ProcedureCommand, reply: Value) -> Result<Self>;
}

fn mismatch(command: ProcedureCommand, expected: &'static str, found: &Value) -> AdapterError {
    AdapterError::mismatch(command.name(), expected, found.type_name())
}

fn scalar(command: ProcedureCommand, expected: &'static str, value: Value) -> Result<String> {
    value.scalar_string().ok_or_else(|| mismatch(command, expected, &value))
}

impl FromReply for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_reply(command: ProcedureCommand, reply: Value) -> Result<Self> {
        match reply {
            Value::Int(i) => Ok(i),
            other => Err(mismatch(command, Self::EXPECTED, &other)),
        }
    }
}

impl FromReply for f64 {
    const EXPECTED: &'static str = "float";

    fn from_reply(command: ProcedureCommand, reply: Value) -> Result<Self> {
        match reply {
            Value::Float(x) => Ok(x),
            Value::Int(i) => Ok(i as f64),
            other => Err(mismatch(command, Self::EXPECTED, &other)),
        }
    }
}

impl FromReply for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_reply(command: ProcedureCommand, reply: Value) -> Result<Self> {
        match reply {
            Value::Bool(b) => Ok(b),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            other => Err(mismatch(command, Self::EXPECTED, &other)),
        }
    }
}

impl FromReply for Status {
    const EXPECTED: &'static str = "status";

    fn from_reply(command: ProcedureCommand, reply: Value) -> Result<Self> {
        match reply {
            Value::Str(s) => Ok(Status(s)),
            other => Err(mismatch(command, Self::EXPECTED, &other)),
        }
    }
}

impl FromReply for Option<String> {
    const EXPECTED: &'static str = "string or nil";

    fn from_reply(command: ProcedureCommand, reply: Value) -> Result<Self> {
        match reply {
            Value::Nil => Ok(None),
            other => scalar(command, Self::EXPECTED, other).map(Some),
        }
    }
}

impl FromReply for Option<Value> {
    const EXPECTED: &'static str = "any";

    fn from_reply(_command: ProcedureCommand, reply: Value) -> Result<Self> {
        Ok(match reply {
            Value::Nil => None,
            other => Some(other),
        })
    }
}

impl FromReply for Vec<String> {
    const EXPECTED: &'static str = "list of strings";

    fn from_reply(command: ProcedureCommand, reply: Value) -> Result<Self> {
        match reply {
            Value::List(items) => items
                .into_iter()
                .map(|item| scalar(command, Self::EXPECTED, item))
                .collect(),
            other => Err(mismatch(command, Self::EXPECTED, &other)),
        }
    }
}

impl FromReply for Vec<Option<String>> {
    const EXPECTED: &'static str = "list of strings or nils";

    fn from_reply(command: ProcedureCommand, reply: Value) -> Result<Self> {
        match reply {
            Value::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Nil => Ok(None),
                    other => scalar(command, Self::EXPECTED, other).map(Some),
                })
                .collect(),
            other => Err(mismatch(command, Self::EXPECTED, &other)),
        }
    }
}

impl FromReply for HashSet<String> {
    const EXPECTED: &'static str = "set of strings";

    fn from_reply(command: ProcedureCommand, reply: Value) -> Result<Self> {
        match reply {
            Value::List(items) => items
                .into_iter()
                .map(|item| scalar(command, Self::EXPECTED, item))
                .collect(),
            other => Err(mismatch(command, Self::EXPECTED, &other)),
        }
    }
}

impl FromReply for HashMap<String, String> {
    const EXPECTED: &'static str = "map of strings";

    fn from_reply(command: ProcedureCommand, reply: Value) -> Result<Self> {
        match reply {
            Value::Map(pairs) => pairs
                .into_iter()
                .map(|(k, v)| {
                    Ok((
                        scalar(command, Self::EXPECTED, k)?,
                        scalar(command, Self::EXPECTED, v)?,
                    ))
                })
                .collect(),
            other => Err(mismatch(command, Self::EXPECTED, &other)),
        }
    }
}

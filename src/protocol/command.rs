//! Command definitions
//!
//! A command line arrives as an argument vector (`["SET", "k", "v"]`).
//! Names are case-insensitive; arguments are kept as text until the
//! adapter decides how to store them.

use crate::error::{AdapterError, Result};
use crate::procedure::ListPosition;

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Strings
    Get { key: String },
    Set { key: String, value: String, condition: Option<SetCondition> },
    SetNx { key: String, value: String },
    SetEx { key: String, seconds: i64, value: String },
    PSetEx { key: String, millis: i64, value: String },
    MSet { pairs: Vec<(String, String)> },
    MSetNx { pairs: Vec<(String, String)> },
    MGet { keys: Vec<String> },
    GetSet { key: String, value: String },
    Strlen { key: String },
    GetRange { key: String, start: i64, end: i64 },
    Append { key: String, value: String },

    // Counters
    Incr { key: String },
    IncrBy { key: String, delta: i64 },
    Decr { key: String },
    DecrBy { key: String, delta: i64 },
    IncrByFloat { key: String, delta: f64 },

    // Keys
    Del { keys: Vec<String> },
    Exists { key: String },
    Keys { pattern: String },
    Rename { key: String, new_key: String },

    // Expiry
    Expire { key: String, seconds: i64 },
    PExpire { key: String, millis: i64 },
    Persist { key: String },
    Ttl { key: String },
    PTtl { key: String },

    // Lists
    RPush { key: String, values: Vec<String> },
    LPush { key: String, values: Vec<String> },
    RPushX { key: String, value: String },
    LPushX { key: String, value: String },
    LLen { key: String },
    LRange { key: String, start: i64, stop: i64 },
    LTrim { key: String, start: i64, stop: i64 },
    LSet { key: String, index: i64, value: String },
    LIndex { key: String, index: i64 },
    LRem { key: String, count: i64, value: String },
    LPop { key: String },
    RPop { key: String },
    RPopLPush { source: String, destination: String },
    LInsert { key: String, position: ListPosition, pivot: String, value: String },

    // Hashes
    HSet { key: String, field: String, value: String },
    HSetNx { key: String, field: String, value: String },
    HGet { key: String, field: String },
    HMSet { key: String, entries: Vec<(String, String)> },
    HMGet { key: String, fields: Vec<String> },
    HIncrBy { key: String, field: String, delta: i64 },
    HIncrByFloat { key: String, field: String, delta: f64 },
    HExists { key: String, field: String },
    HDel { key: String, fields: Vec<String> },
    HLen { key: String },
    HKeys { key: String },
    HVals { key: String },
    HGetAll { key: String },

    // Server
    DbSize,
    Ping,
    Echo { message: String },
}

/// `SET ... NX` / `SET ... XX`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCondition {
    /// Only set if the key does not exist
    IfAbsent,
    /// Only set if the key exists
    IfPresent,
}

/// Argument cursor over one command line
struct Args<'a> {
    name: String,
    rest: &'a [String],
}

impl<'a> Args<'a> {
    fn exactly(&self, count: usize) -> Result<()> {
        if self.rest.len() == count {
            Ok(())
        } else {
            Err(self.arity())
        }
    }

    fn at_least(&self, count: usize) -> Result<()> {
        if self.rest.len() >= count {
            Ok(())
        } else {
            Err(self.arity())
        }
    }

    fn arity(&self) -> AdapterError {
        AdapterError::WrongArity(self.name.to_lowercase())
    }

    fn text(&self, index: usize) -> String {
        self.rest[index].clone()
    }

    fn int(&self, index: usize) -> Result<i64> {
        self.rest[index].parse().map_err(|_| {
            AdapterError::InvalidArgument("value is not an integer or out of range".to_string())
        })
    }

    fn float(&self, index: usize) -> Result<f64> {
        let value: f64 = self.rest[index]
            .parse()
            .map_err(|_| AdapterError::InvalidArgument("value is not a valid float".to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(AdapterError::InvalidArgument("value is not a valid float".to_string()))
        }
    }

    fn texts(&self, from: usize) -> Vec<String> {
        self.rest[from..].to_vec()
    }

    /// Pairs starting at `from`; the remaining count must be even and non-zero
    fn pairs(&self, from: usize) -> Result<Vec<(String, String)>> {
        let tail = &self.rest[from..];
        if tail.is_empty() || tail.len() % 2 != 0 {
            return Err(self.arity());
        }
        Ok(tail
            .chunks(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect())
    }
}

impl Command {
    /// Parse an argument vector into a command
    pub fn parse(argv: &[String]) -> Result<Command> {
        let (name, rest) = argv
            .split_first()
            .ok_or_else(|| AdapterError::UnknownCommand(String::new()))?;
        let args = Args {
            name: name.to_uppercase(),
            rest,
        };

        let command = match args.name.as_str() {
            // -----------------------------------------------------------------
            // Strings
            // -----------------------------------------------------------------
            "GET" => {
                args.exactly(1)?;
                Command::Get { key: args.text(0) }
            }
            "SET" => {
                args.at_least(2)?;
                let condition = match rest.get(2).map(|s| s.to_uppercase()).as_deref() {
                    None => None,
                    Some("NX") => Some(SetCondition::IfAbsent),
                    Some("XX") => Some(SetCondition::IfPresent),
                    Some(_) => return Err(AdapterError::InvalidArgument("syntax error".to_string())),
                };
                if rest.len() > 3 {
                    return Err(AdapterError::InvalidArgument("syntax error".to_string()));
                }
                Command::Set {
                    key: args.text(0),
                    value: args.text(1),
                    condition,
                }
            }
            "SETNX" => {
                args.exactly(2)?;
                Command::SetNx { key: args.text(0), value: args.text(1) }
            }
            "SETEX" => {
                args.exactly(3)?;
                Command::SetEx { key: args.text(0), seconds: args.int(1)?, value: args.text(2) }
            }
            "PSETEX" => {
                args.exactly(3)?;
                Command::PSetEx { key: args.text(0), millis: args.int(1)?, value: args.text(2) }
            }
            "MSET" => Command::MSet { pairs: args.pairs(0)? },
            "MSETNX" => Command::MSetNx { pairs: args.pairs(0)? },
            "MGET" => {
                args.at_least(1)?;
                Command::MGet { keys: args.texts(0) }
            }
            "GETSET" => {
                args.exactly(2)?;
                Command::GetSet { key: args.text(0), value: args.text(1) }
            }
            "STRLEN" => {
                args.exactly(1)?;
                Command::Strlen { key: args.text(0) }
            }
            "GETRANGE" | "SUBSTR" => {
                args.exactly(3)?;
                Command::GetRange { key: args.text(0), start: args.int(1)?, end: args.int(2)? }
            }
            "APPEND" => {
                args.exactly(2)?;
                Command::Append { key: args.text(0), value: args.text(1) }
            }

            // -----------------------------------------------------------------
            // Counters
            // -----------------------------------------------------------------
            "INCR" => {
                args.exactly(1)?;
                Command::Incr { key: args.text(0) }
            }
            "INCRBY" => {
                args.exactly(2)?;
                Command::IncrBy { key: args.text(0), delta: args.int(1)? }
            }
            "DECR" => {
                args.exactly(1)?;
                Command::Decr { key: args.text(0) }
            }
            "DECRBY" => {
                args.exactly(2)?;
                Command::DecrBy { key: args.text(0), delta: args.int(1)? }
            }
            "INCRBYFLOAT" => {
                args.exactly(2)?;
                Command::IncrByFloat { key: args.text(0), delta: args.float(1)? }
            }

            // -----------------------------------------------------------------
            // Keys
            // -----------------------------------------------------------------
            "DEL" => {
                args.at_least(1)?;
                Command::Del { keys: args.texts(0) }
            }
            "EXISTS" => {
                args.exactly(1)?;
                Command::Exists { key: args.text(0) }
            }
            "KEYS" => {
                args.exactly(1)?;
                Command::Keys { pattern: args.text(0) }
            }
            "RENAME" => {
                args.exactly(2)?;
                Command::Rename { key: args.text(0), new_key: args.text(1) }
            }

            // -----------------------------------------------------------------
            // Expiry
            // -----------------------------------------------------------------
            "EXPIRE" => {
                args.exactly(2)?;
                Command::Expire { key: args.text(0), seconds: args.int(1)? }
            }
            "PEXPIRE" => {
                args.exactly(2)?;
                Command::PExpire { key: args.text(0), millis: args.int(1)? }
            }
            "PERSIST" => {
                args.exactly(1)?;
                Command::Persist { key: args.text(0) }
            }
            "TTL" => {
                args.exactly(1)?;
                Command::Ttl { key: args.text(0) }
            }
            "PTTL" => {
                args.exactly(1)?;
                Command::PTtl { key: args.text(0) }
            }

            // -----------------------------------------------------------------
            // Lists
            // -----------------------------------------------------------------
            "RPUSH" => {
                args.at_least(2)?;
                Command::RPush { key: args.text(0), values: args.texts(1) }
            }
            "LPUSH" => {
                args.at_least(2)?;
                Command::LPush { key: args.text(0), values: args.texts(1) }
            }
            "RPUSHX" => {
                args.exactly(2)?;
                Command::RPushX { key: args.text(0), value: args.text(1) }
            }
            "LPUSHX" => {
                args.exactly(2)?;
                Command::LPushX { key: args.text(0), value: args.text(1) }
            }
            "LLEN" => {
                args.exactly(1)?;
                Command::LLen { key: args.text(0) }
            }
            "LRANGE" => {
                args.exactly(3)?;
                Command::LRange { key: args.text(0), start: args.int(1)?, stop: args.int(2)? }
            }
            "LTRIM" => {
                args.exactly(3)?;
                Command::LTrim { key: args.text(0), start: args.int(1)?, stop: args.int(2)? }
            }
            "LSET" => {
                args.exactly(3)?;
                Command::LSet { key: args.text(0), index: args.int(1)?, value: args.text(2) }
            }
            "LINDEX" => {
                args.exactly(2)?;
                Command::LIndex { key: args.text(0), index: args.int(1)? }
            }
            "LREM" => {
                args.exactly(3)?;
                Command::LRem { key: args.text(0), count: args.int(1)?, value: args.text(2) }
            }
            "LPOP" => {
                args.exactly(1)?;
                Command::LPop { key: args.text(0) }
            }
            "RPOP" => {
                args.exactly(1)?;
                Command::RPop { key: args.text(0) }
            }
            "RPOPLPUSH" => {
                args.exactly(2)?;
                Command::RPopLPush { source: args.text(0), destination: args.text(1) }
            }
            "LINSERT" => {
                args.exactly(4)?;
                let position = match rest[1].to_uppercase().as_str() {
                    "BEFORE" => ListPosition::Before,
                    "AFTER" => ListPosition::After,
                    _ => return Err(AdapterError::InvalidArgument("syntax error".to_string())),
                };
                Command::LInsert {
                    key: args.text(0),
                    position,
                    pivot: args.text(2),
                    value: args.text(3),
                }
            }

            // -----------------------------------------------------------------
            // Hashes
            // -----------------------------------------------------------------
            "HSET" => {
                args.exactly(3)?;
                Command::HSet { key: args.text(0), field: args.text(1), value: args.text(2) }
            }
            "HSETNX" => {
                args.exactly(3)?;
                Command::HSetNx { key: args.text(0), field: args.text(1), value: args.text(2) }
            }
            "HGET" => {
                args.exactly(2)?;
                Command::HGet { key: args.text(0), field: args.text(1) }
            }
            "HMSET" => {
                args.at_least(3)?;
                Command::HMSet { key: args.text(0), entries: args.pairs(1)? }
            }
            "HMGET" => {
                args.at_least(2)?;
                Command::HMGet { key: args.text(0), fields: args.texts(1) }
            }
            "HINCRBY" => {
                args.exactly(3)?;
                Command::HIncrBy { key: args.text(0), field: args.text(1), delta: args.int(2)? }
            }
            "HINCRBYFLOAT" => {
                args.exactly(3)?;
                Command::HIncrByFloat { key: args.text(0), field: args.text(1), delta: args.float(2)? }
            }
            "HEXISTS" => {
                args.exactly(2)?;
                Command::HExists { key: args.text(0), field: args.text(1) }
            }
            "HDEL" => {
                args.at_least(2)?;
                Command::HDel { key: args.text(0), fields: args.texts(1) }
            }
            "HLEN" => {
                args.exactly(1)?;
                Command::HLen { key: args.text(0) }
            }
            "HKEYS" => {
                args.exactly(1)?;
                Command::HKeys { key: args.text(0) }
            }
            "HVALS" => {
                args.exactly(1)?;
                Command::HVals { key: args.text(0) }
            }
            "HGETALL" => {
                args.exactly(1)?;
                Command::HGetAll { key: args.text(0) }
            }

            // -----------------------------------------------------------------
            // Server
            // -----------------------------------------------------------------
            "DBSIZE" => {
                args.exactly(0)?;
                Command::DbSize
            }
            "PING" => {
                args.exactly(0)?;
                Command::Ping
            }
            "ECHO" => {
                args.exactly(1)?;
                Command::Echo { message: args.text(0) }
            }

            _ => return Err(AdapterError::UnknownCommand(name.clone())),
        };

        Ok(command)
    }

    /// Split a command line on whitespace, honoring double quotes
    pub fn tokenize(line: &str) -> Result<Vec<String>> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut pending = false;

        let mut chars = line.chars();
        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    in_quotes = !in_quotes;
                    pending = true;
                }
                '\\' if in_quotes => {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                }
                c if c.is_whitespace() && !in_quotes => {
                    if pending {
                        tokens.push(std::mem::take(&mut current));
                        pending = false;
                    }
                }
                c => {
                    current.push(c);
                    pending = true;
                }
            }
        }

        if in_quotes {
            return Err(AdapterError::InvalidArgument("unbalanced quotes".to_string()));
        }
        if pending {
            tokens.push(current);
        }
        Ok(tokens)
    }
}

//! Text command execution
//!
//! Routes a parsed [`Command`] to the typed adapter method and wraps the
//! result in a [`Reply`].

use crate::error::Result;
use crate::protocol::{Command, Reply, SetCondition};
use crate::store::RecordStore;
use crate::value::Value;

use super::Adapter;

/// Interpret a command-line argument as a stored value
///
/// Decimal integers are stored as integers so counters work on values
/// written with SET; everything else is stored as a string.
fn literal(text: &str) -> Value {
    match text.parse::<i64>() {
        Ok(n) if n.to_string() == text => Value::Int(n),
        _ => Value::from(text),
    }
}

fn literals(texts: &[String]) -> Vec<Value> {
    texts.iter().map(|t| literal(t)).collect()
}

fn ok() -> Reply {
    Reply::Status("OK".to_string())
}

fn int(n: impl Into<i64>) -> Reply {
    Reply::Integer(n.into())
}

fn float(x: f64) -> Reply {
    Reply::bulk(Value::Float(x).to_string())
}

impl<S: RecordStore> Adapter<S> {
    /// Execute one parsed command
    pub fn execute(&self, command: Command) -> Result<Reply> {
        tracing::trace!("Executing {:?}", command);

        let reply = match command {
            // Strings
            Command::Get { key } => Reply::Bulk(self.get_string(key)?),
            Command::Set { key, value, condition } => match condition {
                None => {
                    self.set(key, literal(&value))?;
                    ok()
                }
                Some(SetCondition::IfAbsent) => match self.setnx(key, literal(&value))? {
                    1 => ok(),
                    _ => Reply::nil(),
                },
                Some(SetCondition::IfPresent) => match self.setxx(key, literal(&value))? {
                    1 => ok(),
                    _ => Reply::nil(),
                },
            },
            Command::SetNx { key, value } => int(self.setnx(key, literal(&value))?),
            Command::SetEx { key, seconds, value } => {
                self.setex(key, seconds, literal(&value))?;
                ok()
            }
            Command::PSetEx { key, millis, value } => {
                self.psetex(key, millis, literal(&value))?;
                ok()
            }
            Command::MSet { pairs } => {
                let pairs: Vec<(String, Value)> = pairs.into_iter().map(|(k, v)| (k, literal(&v))).collect();
                self.mset(&pairs)?;
                ok()
            }
            Command::MSetNx { pairs } => {
                let pairs: Vec<(String, Value)> = pairs.into_iter().map(|(k, v)| (k, literal(&v))).collect();
                Reply::Integer(self.msetnx(&pairs)? as i64)
            }
            Command::MGet { keys } => Reply::Array(
                self.mget(&keys)?
                    .into_iter()
                    .map(|value| value.and_then(|v| v.scalar_string()))
                    .collect(),
            ),
            Command::GetSet { key, value } => {
                Reply::Bulk(self.getset(key, literal(&value))?.and_then(|v| v.scalar_string()))
            }
            Command::Strlen { key } => Reply::Integer(self.strlen(key)? as i64),
            Command::GetRange { key, start, end } => Reply::bulk(self.getrange(key, start, end)?),
            Command::Append { key, value } => Reply::Integer(self.append(key, &value)? as i64),

            // Counters
            Command::Incr { key } => int(self.incr(key)?),
            Command::IncrBy { key, delta } => int(self.incr_by(key, delta)?),
            Command::Decr { key } => int(self.decr(key)?),
            Command::DecrBy { key, delta } => int(self.decr_by(key, delta)?),
            Command::IncrByFloat { key, delta } => float(self.incr_by_float(key, delta)?),

            // Keys
            Command::Del { keys } => Reply::Integer(self.del_many(&keys)? as i64),
            Command::Exists { key } => int(self.exists(key)?),
            Command::Keys { pattern } => Reply::sorted(self.keys(&pattern)?),
            Command::Rename { key, new_key } => {
                self.rename(key, new_key)?;
                ok()
            }

            // Expiry
            Command::Expire { key, seconds } => int(self.expire(key, seconds)?),
            Command::PExpire { key, millis } => int(self.pexpire(key, millis)?),
            Command::Persist { key } => int(self.persist(key)?),
            Command::Ttl { key } => int(self.ttl(key)?),
            Command::PTtl { key } => int(self.pttl(key)?),

            // Lists
            Command::RPush { key, values } => int(self.rpush_all(key, &literals(&values))?),
            Command::LPush { key, values } => int(self.lpush_all(key, &literals(&values))?),
            Command::RPushX { key, value } => int(self.rpushx(key, literal(&value))?),
            Command::LPushX { key, value } => int(self.lpushx(key, literal(&value))?),
            Command::LLen { key } => int(self.llen(key)?),
            Command::LRange { key, start, stop } => Reply::strings(self.lrange(key, start, stop)?),
            Command::LTrim { key, start, stop } => Reply::Status(self.ltrim(key, start, stop)?.0),
            Command::LSet { key, index, value } => Reply::Status(self.lset(key, index, literal(&value))?.0),
            Command::LIndex { key, index } => Reply::Bulk(self.lindex(key, index)?),
            Command::LRem { key, count, value } => int(self.lrem(key, count, literal(&value))?),
            Command::LPop { key } => Reply::Bulk(self.lpop(key)?),
            Command::RPop { key } => Reply::Bulk(self.rpop(key)?),
            Command::RPopLPush { source, destination } => Reply::Bulk(self.rpoplpush(source, destination)?),
            Command::LInsert { key, position, pivot, value } => {
                int(self.linsert(key, position, literal(&pivot), literal(&value))?)
            }

            // Hashes
            Command::HSet { key, field, value } => int(self.hset(key, &field, literal(&value))?),
            Command::HSetNx { key, field, value } => int(self.hsetnx(key, &field, literal(&value))?),
            Command::HGet { key, field } => Reply::Bulk(self.hget(key, &field)?),
            Command::HMSet { key, entries } => {
                let entries: Vec<(String, Value)> = entries.into_iter().map(|(f, v)| (f, literal(&v))).collect();
                Reply::Status(self.hmset(key, &entries)?.0)
            }
            Command::HMGet { key, fields } => Reply::Array(self.hmget(key, &fields)?),
            Command::HIncrBy { key, field, delta } => int(self.hincr_by(key, &field, delta)?),
            Command::HIncrByFloat { key, field, delta } => float(self.hincr_by_float(key, &field, delta)?),
            Command::HExists { key, field } => int(self.hexists(key, &field)?),
            Command::HDel { key, fields } => int(self.hdel_many(key, &fields)?),
            Command::HLen { key } => int(self.hlen(key)?),
            Command::HKeys { key } => Reply::sorted(self.hkeys(key)?),
            Command::HVals { key } => Reply::strings(self.hvals(key)?),
            Command::HGetAll { key } => {
                let mut pairs: Vec<(String, String)> = self.hgetall(key)?.into_iter().collect();
                pairs.sort();
                Reply::Map(pairs)
            }

            // Server
            Command::DbSize => Reply::Integer(self.dbsize()? as i64),
            Command::Ping => Reply::Status(self.ping()?),
            Command::Echo { message } => Reply::bulk(self.echo(&message)),
        };

        Ok(reply)
    }
}

//! Built-in collection procedures for the in-memory store
//!
//! Stands in for the server-side module the adapter dispatches list and hash
//! commands to. Each procedure receives the record's bins and positional
//! arguments, the first of which is always the name of the bin holding the
//! collection. Lists are stored as `Value::List`, hashes as `Value::Map`.
//!
//! Semantics follow the Redis commands of the same name.

use std::collections::HashMap;

use crate::value::Value;

/// Failure raised by a procedure
#[derive(Debug)]
pub(super) enum ProcedureError {
    /// The bin holds a value of the wrong kind for the command
    WrongType(String),

    /// Any other procedure failure (bad argument, index out of range, ...)
    Failed(String),
}

type ProcResult<T> = std::result::Result<T, ProcedureError>;

fn failed(message: impl Into<String>) -> ProcedureError {
    ProcedureError::Failed(message.into())
}

fn wrong_type(expected: &str, found: &Value) -> ProcedureError {
    ProcedureError::WrongType(format!(
        "WRONGTYPE operation against a key holding {}, expected {}",
        found.type_name(),
        expected
    ))
}

fn ok() -> Value {
    Value::Str("OK".to_string())
}

// =============================================================================
// Arguments
// =============================================================================

struct Args<'a> {
    function: &'a str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    fn get(&self, index: usize) -> ProcResult<&'a Value> {
        self.values
            .get(index)
            .ok_or_else(|| failed(format!("{}: missing argument {}", self.function, index)))
    }

    fn bin(&self) -> ProcResult<&'a str> {
        match self.get(0)? {
            Value::Str(name) => Ok(name.as_str()),
            other => Err(failed(format!("{}: bin name must be a string, got {}", self.function, other.type_name()))),
        }
    }

    fn int(&self, index: usize) -> ProcResult<i64> {
        match self.get(index)? {
            Value::Int(i) => Ok(*i),
            other => Err(failed(format!("{}: argument {} must be an integer, got {}", self.function, index, other.type_name()))),
        }
    }

    fn float(&self, index: usize) -> ProcResult<f64> {
        match self.get(index)? {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            other => Err(failed(format!("{}: argument {} must be a number, got {}", self.function, index, other.type_name()))),
        }
    }

    fn flag(&self, index: usize) -> ProcResult<bool> {
        match self.get(index)? {
            Value::Bool(b) => Ok(*b),
            other => Err(failed(format!("{}: argument {} must be a boolean, got {}", self.function, index, other.type_name()))),
        }
    }

    fn text(&self, index: usize) -> ProcResult<&'a str> {
        match self.get(index)? {
            Value::Str(s) => Ok(s.as_str()),
            other => Err(failed(format!("{}: argument {} must be a string, got {}", self.function, index, other.type_name()))),
        }
    }

    fn rest(&self, from: usize) -> &'a [Value] {
        self.values.get(from..).unwrap_or(&[])
    }
}

// =============================================================================
// Bin access
// =============================================================================

fn list_mut<'b>(
    bins: &'b mut HashMap<String, Value>,
    bin: &str,
    create: bool,
) -> ProcResult<Option<&'b mut Vec<Value>>> {
    if create && !bins.contains_key(bin) {
        bins.insert(bin.to_string(), Value::List(Vec::new()));
    }
    match bins.get_mut(bin) {
        None => Ok(None),
        Some(Value::List(items)) => Ok(Some(items)),
        Some(other) => Err(wrong_type("list", other)),
    }
}

fn map_mut<'b>(
    bins: &'b mut HashMap<String, Value>,
    bin: &str,
    create: bool,
) -> ProcResult<Option<&'b mut Vec<(Value, Value)>>> {
    if create && !bins.contains_key(bin) {
        bins.insert(bin.to_string(), Value::Map(Vec::new()));
    }
    match bins.get_mut(bin) {
        None => Ok(None),
        Some(Value::Map(pairs)) => Ok(Some(pairs)),
        Some(other) => Err(wrong_type("hash", other)),
    }
}

/// Resolve a possibly negative index against `len`
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

/// Resolve an inclusive, possibly negative range against `len`
fn resolve_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// Scalar procedures carry the key bin name and logical key at `index` and
/// `index + 1`, and write them alongside the value
fn write_key_bin(args: &Args<'_>, index: usize, bins: &mut HashMap<String, Value>) -> ProcResult<()> {
    let key_bin = args.text(index)?;
    let key = args.get(index + 1)?.clone();
    bins.insert(key_bin.to_string(), key);
    Ok(())
}

fn field_position(pairs: &[(Value, Value)], field: &Value) -> Option<usize> {
    pairs.iter().position(|(k, _)| k == field)
}

fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(x) => Some(*x),
        Value::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Run `function` against a record's bins
///
/// `bins` is mutated in place; the caller commits it only on success.
pub(super) fn invoke(
    function: &str,
    bins: &mut HashMap<String, Value>,
    args: &[Value],
) -> ProcResult<Value> {
    let args = Args { function, values: args };
    let bin = args.bin()?;

    match function {
        // ---------------------------------------------------------------------
        // Scalars
        // ---------------------------------------------------------------------
        "INCRBYFLOAT" => {
            let delta = args.float(1)?;
            let current = match bins.get(bin) {
                None => 0.0,
                Some(v) => parse_float(v).ok_or_else(|| wrong_type("number", v))?,
            };
            let updated = current + delta;
            if !updated.is_finite() {
                return Err(failed("increment would produce NaN or Infinity"));
            }
            write_key_bin(&args, 2, bins)?;
            bins.insert(bin.to_string(), Value::Float(updated));
            Ok(Value::Float(updated))
        }
        "GETSET" => {
            let value = args.get(1)?.clone();
            if let Some(current @ (Value::List(_) | Value::Map(_))) = bins.get(bin) {
                return Err(wrong_type("string", current));
            }
            write_key_bin(&args, 2, bins)?;
            Ok(bins.insert(bin.to_string(), value).unwrap_or(Value::Nil))
        }

        // ---------------------------------------------------------------------
        // Lists
        // ---------------------------------------------------------------------
        "RPUSH" | "LPUSH" | "RPUSHX" | "LPUSHX" => {
            let only_existing = function.ends_with('X');
            let values = args.rest(1);
            if values.is_empty() {
                return Err(failed(format!("{}: nothing to push", function)));
            }
            let Some(items) = list_mut(bins, bin, !only_existing)? else {
                return Ok(Value::Int(0));
            };
            for value in values {
                if function.starts_with('R') {
                    items.push(value.clone());
                } else {
                    items.insert(0, value.clone());
                }
            }
            Ok(Value::Int(items.len() as i64))
        }
        "LLEN" => Ok(Value::Int(
            list_mut(bins, bin, false)?.map(|items| items.len() as i64).unwrap_or(0),
        )),
        "LRANGE" => {
            let (start, stop) = (args.int(1)?, args.int(2)?);
            let items = list_mut(bins, bin, false)?;
            let slice = items
                .and_then(|items| resolve_range(start, stop, items.len()).map(|(s, e)| items[s..=e].to_vec()))
                .unwrap_or_default();
            Ok(Value::List(slice))
        }
        "LTRIM" => {
            let (start, stop) = (args.int(1)?, args.int(2)?);
            if let Some(items) = list_mut(bins, bin, false)? {
                match resolve_range(start, stop, items.len()) {
                    Some((s, e)) => {
                        items.truncate(e + 1);
                        items.drain(..s);
                    }
                    None => items.clear(),
                }
            }
            Ok(ok())
        }
        "LSET" => {
            let index = args.int(1)?;
            let value = args.get(2)?.clone();
            let items = list_mut(bins, bin, false)?.ok_or_else(|| failed("no such key"))?;
            let slot = resolve_index(index, items.len()).ok_or_else(|| failed("index out of range"))?;
            items[slot] = value;
            Ok(ok())
        }
        "LINDEX" => {
            let index = args.int(1)?;
            Ok(list_mut(bins, bin, false)?
                .and_then(|items| resolve_index(index, items.len()).map(|i| items[i].clone()))
                .unwrap_or(Value::Nil))
        }
        "LREM" => {
            let count = args.int(1)?;
            let target = args.get(2)?;
            let Some(items) = list_mut(bins, bin, false)? else {
                return Ok(Value::Int(0));
            };
            let limit = if count == 0 { usize::MAX } else { count.unsigned_abs() as usize };
            let mut removed = 0usize;
            if count >= 0 {
                items.retain(|item| {
                    if removed < limit && item == target {
                        removed += 1;
                        false
                    } else {
                        true
                    }
                });
            } else {
                let mut index = items.len();
                while index > 0 && removed < limit {
                    index -= 1;
                    if &items[index] == target {
                        items.remove(index);
                        removed += 1;
                    }
                }
            }
            Ok(Value::Int(removed as i64))
        }
        "LPOP" | "RPOP" => {
            let count = match args.values.get(1) {
                Some(_) => args.int(1)?,
                None => 1,
            };
            if count != 1 {
                return Err(failed(format!("{}: only a count of 1 is supported", function)));
            }
            let popped = list_mut(bins, bin, false)?.and_then(|items| {
                if items.is_empty() {
                    None
                } else if function == "LPOP" {
                    Some(items.remove(0))
                } else {
                    items.pop()
                }
            });
            Ok(popped.unwrap_or(Value::Nil))
        }
        "RPOPLPUSH" => {
            // Other destinations are pushed by the caller
            let rotate = args.flag(1)?;
            let Some(items) = list_mut(bins, bin, false)? else {
                return Ok(Value::Nil);
            };
            let Some(popped) = items.pop() else {
                return Ok(Value::Nil);
            };
            if rotate {
                items.insert(0, popped.clone());
            }
            Ok(popped)
        }
        "LINSERT" => {
            let position = match args.get(1)? {
                Value::Str(p) if p.eq_ignore_ascii_case("BEFORE") => 0,
                Value::Str(p) if p.eq_ignore_ascii_case("AFTER") => 1,
                other => return Err(failed(format!("LINSERT: invalid position {}", other))),
            };
            let pivot = args.get(2)?;
            let value = args.get(3)?.clone();
            let Some(items) = list_mut(bins, bin, false)? else {
                return Ok(Value::Int(0));
            };
            match items.iter().position(|item| item == pivot) {
                Some(at) => {
                    items.insert(at + position, value);
                    Ok(Value::Int(items.len() as i64))
                }
                None => Ok(Value::Int(-1)),
            }
        }

        // ---------------------------------------------------------------------
        // Hashes
        // ---------------------------------------------------------------------
        "HSET" | "HSETNX" => {
            let field = args.get(1)?.clone();
            let value = args.get(2)?.clone();
            let pairs = map_mut(bins, bin, true)?.ok_or_else(|| failed("hash not created"))?;
            match field_position(pairs, &field) {
                Some(_) if function == "HSETNX" => Ok(Value::Int(0)),
                Some(at) => {
                    pairs[at].1 = value;
                    Ok(Value::Int(0))
                }
                None => {
                    pairs.push((field, value));
                    Ok(Value::Int(1))
                }
            }
        }
        "HGET" => {
            let field = args.get(1)?;
            Ok(map_mut(bins, bin, false)?
                .and_then(|pairs| field_position(pairs, field).map(|at| pairs[at].1.clone()))
                .unwrap_or(Value::Nil))
        }
        "HMSET" => {
            let entries = match args.get(1)? {
                Value::Map(entries) => entries,
                other => return Err(failed(format!("HMSET: expected a map, got {}", other.type_name()))),
            };
            let pairs = map_mut(bins, bin, true)?.ok_or_else(|| failed("hash not created"))?;
            for (field, value) in entries {
                match field_position(pairs, field) {
                    Some(at) => pairs[at].1 = value.clone(),
                    None => pairs.push((field.clone(), value.clone())),
                }
            }
            Ok(ok())
        }
        "HMGET" => {
            let fields = match args.get(1)? {
                Value::List(fields) => fields,
                other => return Err(failed(format!("HMGET: expected a list, got {}", other.type_name()))),
            };
            let pairs = map_mut(bins, bin, false)?;
            let values = fields
                .iter()
                .map(|field| {
                    pairs
                        .as_ref()
                        .and_then(|pairs| field_position(pairs, field).map(|at| pairs[at].1.clone()))
                        .unwrap_or(Value::Nil)
                })
                .collect();
            Ok(Value::List(values))
        }
        "HINCRBY" => {
            let field = args.get(1)?.clone();
            let delta = args.int(2)?;
            let pairs = map_mut(bins, bin, true)?.ok_or_else(|| failed("hash not created"))?;
            let at = field_position(pairs, &field);
            let current = match at {
                Some(at) => parse_int(&pairs[at].1)
                    .ok_or_else(|| ProcedureError::WrongType("hash value is not an integer".to_string()))?,
                None => 0,
            };
            let updated = current
                .checked_add(delta)
                .ok_or_else(|| failed("increment or decrement would overflow"))?;
            match at {
                Some(at) => pairs[at].1 = Value::Int(updated),
                None => pairs.push((field, Value::Int(updated))),
            }
            Ok(Value::Int(updated))
        }
        "HINCRBYFLOAT" => {
            let field = args.get(1)?.clone();
            let delta = args.float(2)?;
            let pairs = map_mut(bins, bin, true)?.ok_or_else(|| failed("hash not created"))?;
            let at = field_position(pairs, &field);
            let current = match at {
                Some(at) => parse_float(&pairs[at].1)
                    .ok_or_else(|| ProcedureError::WrongType("hash value is not a float".to_string()))?,
                None => 0.0,
            };
            let updated = current + delta;
            if !updated.is_finite() {
                return Err(failed("increment would produce NaN or Infinity"));
            }
            match at {
                Some(at) => pairs[at].1 = Value::Float(updated),
                None => pairs.push((field, Value::Float(updated))),
            }
            Ok(Value::Float(updated))
        }
        "HEXISTS" => {
            let field = args.get(1)?;
            Ok(Value::Bool(
                map_mut(bins, bin, false)?
                    .map(|pairs| field_position(pairs, field).is_some())
                    .unwrap_or(false),
            ))
        }
        "HDEL" => {
            let fields = args.rest(1);
            let Some(pairs) = map_mut(bins, bin, false)? else {
                return Ok(Value::Int(0));
            };
            let before = pairs.len();
            pairs.retain(|(k, _)| !fields.contains(k));
            Ok(Value::Int((before - pairs.len()) as i64))
        }
        "HLEN" => Ok(Value::Int(
            map_mut(bins, bin, false)?.map(|pairs| pairs.len() as i64).unwrap_or(0),
        )),
        "HKEYS" | "HVALS" => {
            let keys = function == "HKEYS";
            let items: Vec<Value> = map_mut(bins, bin, false)?
                .map(|pairs| {
                    pairs
                        .iter()
                        .map(|(k, v)| if keys { k.clone() } else { v.clone() })
                        .collect()
                })
                .unwrap_or_default();
            Ok(Value::List(items))
        }
        "HGETALL" => Ok(Value::Map(
            map_mut(bins, bin, false)?.map(|pairs| pairs.clone()).unwrap_or_default(),
        )),

        other => Err(failed(format!("function '{}' not found", other))),
    }
}

//! Value model
//!
//! The store is dynamically typed: every bin holds a [`Value`], and every
//! record is addressed by a [`Key`] (integer, string or blob). Caller keys
//! are converted through [`ToKey`]; no normalization is applied beyond the
//! type conversion, so two logical keys that convert to the same `Key`
//! address the same record.

use std::fmt;

use bytes::Bytes;

use crate::error::{AdapterError, Result};

// =============================================================================
// Key
// =============================================================================

/// A record key in the store's native representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Str(String),
    Blob(Bytes),
}

impl Key {
    /// Bytes used for digesting the key (type tag + payload)
    pub fn digest_bytes(&self) -> Vec<u8> {
        match self {
            Key::Int(i) => {
                let mut out = vec![1u8];
                out.extend_from_slice(&i.to_be_bytes());
                out
            }
            Key::Str(s) => {
                let mut out = vec![3u8];
                out.extend_from_slice(s.as_bytes());
                out
            }
            Key::Blob(b) => {
                let mut out = vec![4u8];
                out.extend_from_slice(b);
                out
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{}", i),
            Key::Str(s) => f.write_str(s),
            Key::Blob(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Int(i) => Value::Int(i),
            Key::Str(s) => Value::Str(s),
            Key::Blob(b) => Value::Blob(b),
        }
    }
}

// =============================================================================
// ToKey
// =============================================================================

/// Conversion from a caller-supplied logical key to a store [`Key`]
///
/// Fails with `UnsupportedKeyType` when the input has no key representation.
pub trait ToKey {
    fn to_key(&self) -> Result<Key>;
}

impl ToKey for Key {
    fn to_key(&self) -> Result<Key> {
        Ok(self.clone())
    }
}

impl ToKey for str {
    fn to_key(&self) -> Result<Key> {
        Ok(Key::Str(self.to_string()))
    }
}

impl ToKey for String {
    fn to_key(&self) -> Result<Key> {
        Ok(Key::Str(self.clone()))
    }
}

impl ToKey for [u8] {
    fn to_key(&self) -> Result<Key> {
        Ok(Key::Blob(Bytes::copy_from_slice(self)))
    }
}

impl ToKey for Vec<u8> {
    fn to_key(&self) -> Result<Key> {
        Ok(Key::Blob(Bytes::copy_from_slice(self)))
    }
}

impl ToKey for Bytes {
    fn to_key(&self) -> Result<Key> {
        Ok(Key::Blob(self.clone()))
    }
}

macro_rules! int_to_key {
    ($($t:ty),*) => {
        $(
            impl ToKey for $t {
                fn to_key(&self) -> Result<Key> {
                    Ok(Key::Int(i64::from(*self)))
                }
            }
        )*
    };
}

int_to_key!(i8, i16, i32, i64, u8, u16, u32);

impl ToKey for u64 {
    fn to_key(&self) -> Result<Key> {
        i64::try_from(*self)
            .map(Key::Int)
            .map_err(|_| AdapterError::UnsupportedKeyType(format!("u64 {} exceeds i64 range", self)))
    }
}

impl ToKey for Value {
    fn to_key(&self) -> Result<Key> {
        match self {
            Value::Int(i) => Ok(Key::Int(*i)),
            Value::Str(s) => Ok(Key::Str(s.clone())),
            Value::Blob(b) => Ok(Key::Blob(b.clone())),
            other => Err(AdapterError::UnsupportedKeyType(other.type_name().to_string())),
        }
    }
}

impl<T: ToKey + ?Sized> ToKey for &T {
    fn to_key(&self) -> Result<Key> {
        (**self).to_key()
    }
}

// =============================================================================
// Value
// =============================================================================

/// A dynamically typed bin value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Int(i64),
    Float(f64),
    Str(String),
    Blob(Bytes),
    Bool(bool),
    List(Vec<Value>),
    /// Ordered key/value pairs (hash contents)
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Blob(_) => "blob",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Render a scalar as a string (strings, numbers, blobs)
    ///
    /// Returns `None` for nil, bool and collection values.
    pub fn scalar_string(&self) -> Option<String> {
        match self {
            Value::Str(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("(nil)"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Blob(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(Bytes::from(b))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Blob(Bytes::copy_from_slice(b))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nil)
    }
}

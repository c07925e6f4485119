//! Reply definitions
//!
//! What a command produces, independent of how it is shown. `Display`
//! renders the familiar interactive-client format.

use std::fmt;

/// A command reply
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Simple status (`OK`, `PONG`)
    Status(String),

    /// Integer reply
    Integer(i64),

    /// Single string, or nil
    Bulk(Option<String>),

    /// Ordered list of strings or nils
    Array(Vec<Option<String>>),

    /// Field/value pairs
    Map(Vec<(String, String)>),
}

impl Reply {
    pub fn nil() -> Self {
        Reply::Bulk(None)
    }

    pub fn bulk(value: impl Into<String>) -> Self {
        Reply::Bulk(Some(value.into()))
    }

    /// Array of present strings
    pub fn strings<I>(items: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Reply::Array(items.into_iter().map(Some).collect())
    }

    /// Array of strings in lexicographic order (for unordered results)
    pub fn sorted<I>(items: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut items: Vec<String> = items.into_iter().collect();
        items.sort();
        Reply::strings(items)
    }
}

fn write_item(f: &mut fmt::Formatter<'_>, item: Option<&str>) -> fmt::Result {
    match item {
        Some(text) => write!(f, "{:?}", text),
        None => f.write_str("(nil)"),
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(status) => f.write_str(status),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(item) => write_item(f, item.as_deref()),
            Reply::Array(items) if items.is_empty() => f.write_str("(empty array)"),
            Reply::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) ", i + 1)?;
                    write_item(f, item.as_deref())?;
                }
                Ok(())
            }
            Reply::Map(pairs) if pairs.is_empty() => f.write_str("(empty array)"),
            Reply::Map(pairs) => {
                for (i, (field, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {:?}\n{}) {:?}", 2 * i + 1, field, 2 * i + 2, value)?;
                }
                Ok(())
            }
        }
    }
}

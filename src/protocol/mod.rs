//! Protocol Module
//!
//! Text command surface on top of the adapter, used by the CLI.
//!
//! ## Flow
//! ```text
//!   "LPUSH jobs a b"
//!        │ Command::tokenize
//!        ▼
//!   ["LPUSH", "jobs", "a", "b"]
//!        │ Command::parse         (name, arity, numeric arguments)
//!        ▼
//!   Command::LPush { key, values }
//!        │ Adapter::execute
//!        ▼
//!   Reply::Integer(2)  ──Display──▶  (integer) 2
//! ```
//!
//! Errors at any step are `AdapterError`s; the CLI prints them as
//! `(error) ...`.

mod command;
mod response;

pub use command::{Command, SetCondition};
pub use response::Reply;

//! # binkv
//!
//! Redis command semantics over a bin-oriented record store:
//! - Scalar keys stored as a two-bin record (original key + value)
//! - Atomic counters and appends through compound `operate` requests
//! - Lists and hashes executed by a server-side procedure module
//! - TTL commands translated between caller time and store-epoch time
//! - Pluggable store boundary with an in-memory multi-node backend
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Caller / binkv-cli (Command, Reply)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Adapter                               │
//! │      (immutable Config, per-call policies, no shared state)  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼────────────────────┐
//!          │            │                    │
//!          ▼            ▼                    ▼
//!   ┌─────────────┐ ┌─────────────┐  ┌───────────────┐
//!   │RecordMapper │ │  ttl / info │  │ procedure     │
//!   │ (key → bins)│ │ (conversion)│  │ (FromReply)   │
//!   └──────┬──────┘ └──────┬──────┘  └───────┬───────┘
//!          └───────────────┼─────────────────┘
//!                          ▼
//!                  ┌───────────────┐
//!                  │  RecordStore  │
//!                  │ (MemoryStore) │
//!                  └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod value;
pub mod policy;
pub mod ttl;
pub mod info;
pub mod store;
pub mod mapping;
pub mod procedure;
pub mod adapter;
pub mod protocol;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use adapter::Adapter;
pub use config::{Config, ModuleSource, ProcedureModule};
pub use error::{AdapterError, Result};
pub use policy::{Expiration, RecordExistsAction, WritePolicy};
pub use procedure::{ListPosition, Status};
pub use protocol::{Command, Reply};
pub use store::{MemoryStore, RecordStore};
pub use ttl::{Clock, ManualClock, SystemClock};
pub use value::{Key, ToKey, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of binkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

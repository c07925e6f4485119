//! Error types for binkv
//!
//! Provides a unified error type for every command and for the store
//! boundary. Conditional commands convert a small subset of these into
//! sentinel returns (see the individual commands); everything else is
//! propagated to the caller unchanged.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using AdapterError
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Unified error type for binkv operations
#[derive(Debug, Error)]
pub enum AdapterError {
    // -------------------------------------------------------------------------
    // Record Existence
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    NotFound,

    #[error("Key already exists")]
    AlreadyExists,

    // -------------------------------------------------------------------------
    // Typing Errors
    // -------------------------------------------------------------------------
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("Protocol mismatch: {command} expected {expected}, got {found}")]
    ProtocolMismatch {
        command: &'static str,
        expected: &'static str,
        found: String,
    },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Procedure {module}.{function} failed: {message}")]
    Procedure {
        module: String,
        function: String,
        message: String,
    },

    #[error("Procedure module registration failed: {0}")]
    Registration(String),

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Wrong number of arguments for '{0}' command")]
    WrongArity(String),

    // -------------------------------------------------------------------------
    // Configuration / I/O Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdapterError {
    /// Build a `ProtocolMismatch` for a reply of the wrong shape
    pub fn mismatch(command: &'static str, expected: &'static str, found: impl Into<String>) -> Self {
        AdapterError::ProtocolMismatch {
            command,
            expected,
            found: found.into(),
        }
    }
}

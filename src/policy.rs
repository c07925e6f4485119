//! Per-call policies
//!
//! Policies are plain immutable values. The adapter derives a fresh one from
//! its `Config` for every call and adjusts it by value (`with_*`), so no
//! policy object is ever shared or mutated across concurrent calls.

use std::time::Duration;

/// Existence precondition applied to a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordExistsAction {
    /// Create or update the named bins (update-or-create)
    Update,

    /// Update the named bins; fail with `NotFound` if absent
    UpdateOnly,

    /// Create or fully replace the record
    Replace,

    /// Fully replace the record; fail with `NotFound` if absent
    ReplaceOnly,

    /// Create the record; fail with `AlreadyExists` if present
    CreateOnly,
}

/// Expiration override applied at write or touch time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// No override: the namespace default TTL applies
    Default,

    /// Expire this many seconds from now
    Seconds(u32),

    /// Never expire
    Never,

    /// Keep the record's current expiration
    Unchanged,
}

/// Policy for point and batch reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadPolicy {
    pub timeout: Option<Duration>,
}

/// Policy for writes, touches, operate and procedure calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePolicy {
    pub exists: RecordExistsAction,
    pub expiration: Expiration,
    pub timeout: Option<Duration>,
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            exists: RecordExistsAction::Update,
            expiration: Expiration::Default,
            timeout: None,
        }
    }
}

impl WritePolicy {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    pub fn with_exists(self, exists: RecordExistsAction) -> Self {
        Self { exists, ..self }
    }

    pub fn with_expiration(self, expiration: Expiration) -> Self {
        Self { expiration, ..self }
    }
}

/// Policy for full set scans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPolicy {
    pub timeout: Option<Duration>,

    /// Scan every node in parallel
    pub concurrent_nodes: bool,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            timeout: None,
            concurrent_nodes: true,
        }
    }
}

/// Policy for administrative info requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InfoPolicy {
    pub timeout: Option<Duration>,
}

//! TTL and epoch arithmetic
//!
//! The store records expiration as whole seconds since its own epoch
//! (2010-01-01T00:00:00Z), with `0` meaning "never expires". Callers work in
//! Unix time and in seconds or milliseconds. Every conversion between the two
//! goes through this module so the offset is applied in exactly one place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds between the Unix epoch and the store epoch
pub const STORE_EPOCH_OFFSET_MS: u64 = 1_262_304_000_000;

/// Stored expiration value meaning "never expires"
pub const NEVER_EXPIRES: u32 = 0;

/// TTL reply for a key that does not exist
pub const TTL_KEY_MISSING: i64 = -2;

/// TTL reply for a key with no expiration
pub const TTL_NO_EXPIRY: i64 = -1;

// =============================================================================
// Clock
// =============================================================================

/// Source of the current Unix time in milliseconds
pub trait Clock: Send + Sync {
    fn now_unix_ms(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Manually advanced clock, shared between a store and an adapter in tests
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_unix_ms: u64) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(start_unix_ms)),
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance_ms(secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now_unix_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// Unix milliseconds to whole seconds since the store epoch (saturating at 0)
pub fn unix_ms_to_store_secs(unix_ms: u64) -> u64 {
    unix_ms.saturating_sub(STORE_EPOCH_OFFSET_MS) / 1000
}

/// Seconds since the store epoch to Unix milliseconds
pub fn store_secs_to_unix_ms(store_secs: u64) -> u64 {
    store_secs * 1000 + STORE_EPOCH_OFFSET_MS
}

/// Absolute store expiration for a record written now with a relative TTL
pub fn expiration_from_ttl(now_unix_ms: u64, ttl_secs: u32) -> u32 {
    let exp = unix_ms_to_store_secs(now_unix_ms) + u64::from(ttl_secs);
    u32::try_from(exp).unwrap_or(u32::MAX)
}

/// Remaining whole seconds for a stored expiration
///
/// Returns `TTL_NO_EXPIRY` for records that never expire. An expiration in
/// the past reports 0.
pub fn remaining_secs(expiration: u32, now_unix_ms: u64) -> i64 {
    if expiration == NEVER_EXPIRES {
        return TTL_NO_EXPIRY;
    }
    let now = unix_ms_to_store_secs(now_unix_ms) as i64;
    (i64::from(expiration) - now).max(0)
}

/// Remaining milliseconds for a stored expiration
pub fn remaining_ms(expiration: u32, now_unix_ms: u64) -> i64 {
    if expiration == NEVER_EXPIRES {
        return TTL_NO_EXPIRY;
    }
    let expires_at = store_secs_to_unix_ms(u64::from(expiration)) as i64;
    (expires_at - now_unix_ms as i64).max(0)
}

/// Milliseconds to whole seconds, rounding partial seconds up
pub fn millis_to_ttl_secs(ms: i64) -> i64 {
    if ms <= 0 {
        return ms / 1000;
    }
    (ms + 999) / 1000
}

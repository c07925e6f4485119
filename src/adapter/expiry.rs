//! Expiration commands
//!
//! TTLs cross the boundary in caller units (seconds or milliseconds,
//! relative to now) and are stored by the store as absolute seconds since
//! its own epoch. All conversions go through `crate::ttl`.

use crate::error::{AdapterError, Result};
use crate::policy::{Expiration, RecordExistsAction};
use crate::store::RecordStore;
use crate::ttl::{self, TTL_KEY_MISSING};
use crate::value::ToKey;

use super::Adapter;

impl<S: RecordStore> Adapter<S> {
    /// EXPIRE: set the remaining TTL; 1 if set, 0 if the key does not exist
    ///
    /// A non-positive TTL deletes the key immediately.
    pub fn expire<K: ToKey>(&self, key: K, seconds: i64) -> Result<i64> {
        let address = self.mapper.resolve_address(key)?;
        if seconds <= 0 {
            let removed = self.store.delete(&self.write_policy(), &address)?;
            return Ok(i64::from(removed));
        }
        let secs = u32::try_from(seconds).map_err(|_| {
            AdapterError::InvalidArgument(format!("expire time {} out of range", seconds))
        })?;

        let policy = self
            .write_policy()
            .with_exists(RecordExistsAction::UpdateOnly)
            .with_expiration(Expiration::Seconds(secs));
        match self.store.touch(&policy, &address) {
            Ok(()) => Ok(1),
            Err(AdapterError::NotFound) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// PEXPIRE: EXPIRE in milliseconds, rounded up to whole seconds
    pub fn pexpire<K: ToKey>(&self, key: K, millis: i64) -> Result<i64> {
        self.expire(key, ttl::millis_to_ttl_secs(millis))
    }

    /// PERSIST: remove the TTL
    ///
    /// Always reports 1, including for keys that do not exist.
    pub fn persist<K: ToKey>(&self, key: K) -> Result<i64> {
        let address = self.mapper.resolve_address(key)?;
        let policy = self
            .write_policy()
            .with_exists(RecordExistsAction::Update)
            .with_expiration(Expiration::Never);
        match self.store.touch(&policy, &address) {
            Ok(()) | Err(AdapterError::NotFound) => Ok(1),
            Err(e) => Err(e),
        }
    }

    /// TTL: remaining seconds, -1 without expiration, -2 if absent
    pub fn ttl<K: ToKey>(&self, key: K) -> Result<i64> {
        let address = self.mapper.resolve_address(key)?;
        match self.store.get_header(&self.read_policy(), &address)? {
            Some(header) => Ok(ttl::remaining_secs(header.expiration, self.clock.now_unix_ms())),
            None => Ok(TTL_KEY_MISSING),
        }
    }

    /// PTTL: remaining milliseconds, -1 without expiration, -2 if absent
    pub fn pttl<K: ToKey>(&self, key: K) -> Result<i64> {
        let address = self.mapper.resolve_address(key)?;
        match self.store.get_header(&self.read_policy(), &address)? {
            Some(header) => Ok(ttl::remaining_ms(header.expiration, self.clock.now_unix_ms())),
            None => Ok(TTL_KEY_MISSING),
        }
    }
}

//! Port and key type for the read-through cache.
//!
//! The cache is derived and disposable: the store is the single source of
//! truth. Adapters must be safe for concurrent use; failures are surfaced
//! here and swallowed by the coordinator.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ids::{BookingId, PaymentId, RideId, UserId};

/// Namespaced cache key, e.g. `ride:{id}` or `rides:all`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

/// Validation errors returned when constructing a [`CacheKey`] from raw
/// input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheKeyValidationError {
    /// Key is empty after trimming whitespace.
    #[error("cache key must not be empty")]
    Empty,
    /// Key contains leading or trailing whitespace.
    #[error("cache key must not contain surrounding whitespace")]
    ContainsWhitespace,
}

impl CacheKey {
    /// Construct a key from raw input, validating that it is non-empty and
    /// trimmed. The entity builders below are preferred where they apply.
    pub fn new(value: impl Into<String>) -> Result<Self, CacheKeyValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(CacheKeyValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(CacheKeyValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Per-ride detail key.
    pub fn ride(id: &RideId) -> Self {
        Self(format!("ride:{id}"))
    }

    /// Ride list key.
    pub fn rides_all() -> Self {
        Self("rides:all".to_owned())
    }

    /// Per-user detail key.
    pub fn user(id: &UserId) -> Self {
        Self(format!("user:{id}"))
    }

    /// User list key.
    pub fn users_all() -> Self {
        Self("users:all".to_owned())
    }

    /// Per-booking detail key.
    pub fn booking(id: &BookingId) -> Self {
        Self(format!("booking:{id}"))
    }

    /// Booking list key.
    pub fn bookings_all() -> Self {
        Self("bookings:all".to_owned())
    }

    /// Per-payment detail key.
    pub fn payment(id: &PaymentId) -> Self {
        Self(format!("payment:{id}"))
    }

    /// Payment list key.
    pub fn payments_all() -> Self {
        Self("payments:all".to_owned())
    }

    /// Borrow the underlying key.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Errors surfaced by cache adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// Cache backend is unavailable or timing out.
    #[error("cache backend failure: {message}")]
    Backend { message: String },
}

impl CacheError {
    /// Create a backend error with the given message.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Port for the key-value cache. Values are JSON-encoded strings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Cache: Send + Sync {
    /// Read a cached value.
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    /// Store a value with a time-to-live.
    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Drop a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError>;
}

/// Fixture cache that always misses and discards writes; useful for wiring
/// the engine without a cache backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, _key: &CacheKey) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &CacheKey, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &CacheKey) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_keys_are_rejected(#[case] value: &str) {
        let err = CacheKey::new(value).expect_err("blank key rejected");
        assert_eq!(err, CacheKeyValidationError::Empty);
    }

    #[rstest]
    #[case(" leading")]
    #[case("trailing ")]
    fn padded_keys_are_rejected(#[case] value: &str) {
        let err = CacheKey::new(value).expect_err("padded key rejected");
        assert_eq!(err, CacheKeyValidationError::ContainsWhitespace);
    }

    #[rstest]
    fn builders_follow_the_key_convention() {
        let ride_id = RideId::random();
        assert_eq!(CacheKey::ride(&ride_id).as_str(), format!("ride:{ride_id}"));
        assert_eq!(CacheKey::rides_all().as_str(), "rides:all");
        assert_eq!(CacheKey::users_all().as_str(), "users:all");
    }

    #[rstest]
    #[tokio::test]
    async fn noop_cache_always_misses() {
        let cache = NoopCache;
        let key = CacheKey::rides_all();
        cache
            .set(&key, "[]", Duration::from_secs(60))
            .await
            .expect("set succeeds");
        let value = cache.get(&key).await.expect("get succeeds");
        assert!(value.is_none());
    }
}

//! Read-through cache with write invalidation.
//!
//! This is the single place cache-aside logic lives; mutation paths declare
//! their invalidation obligations through the per-entity helpers instead of
//! re-deriving key lists at each call site. Two rules hold everywhere:
//!
//! - Cache failures never fail the underlying read or write. A broken cache
//!   degrades to an uncached path with a `warn` log.
//! - Mutations invalidate (delete) rather than write through, so a late
//!   reader always repopulates from the store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::error::DomainError;
use super::ids::{BookingId, PaymentId, RideId, UserId};
use super::ports::{Cache, CacheKey};

/// Default time-to-live for list and detail reads.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Shared cache façade used by every service.
#[derive(Clone)]
pub struct CacheCoordinator {
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl CacheCoordinator {
    /// Create a coordinator with the default TTL.
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Override the TTL applied to populated entries.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Read through the cache: serve a decodable hit, otherwise run `fetch`
    /// against the store and populate the key with the result.
    ///
    /// Fetch errors propagate untouched and are never cached.
    pub async fn get_or_populate<T, F, Fut>(
        &self,
        key: CacheKey,
        fetch: F,
    ) -> Result<T, DomainError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(key = %key, error = %err, "discarding undecodable cache entry");
                }
            },
            Ok(None) => {}
            Err(err) => {
                warn!(key = %key, error = %err, "cache read failed, serving from store");
            }
        }

        let value = fetch().await?;

        match serde_json::to_string(&value) {
            Ok(encoded) => {
                if let Err(err) = self.cache.set(&key, &encoded, self.ttl).await {
                    warn!(key = %key, error = %err, "cache write failed, continuing uncached");
                }
            }
            Err(err) => {
                warn!(key = %key, error = %err, "cache encode failed, continuing uncached");
            }
        }

        Ok(value)
    }

    /// Delete the given keys, logging failures without surfacing them.
    pub async fn invalidate(&self, keys: &[CacheKey]) {
        for key in keys {
            if let Err(err) = self.cache.delete(key).await {
                warn!(key = %key, error = %err, "cache invalidation failed");
            }
        }
    }

    /// Invalidate every key that could hold a stale view of a ride.
    pub async fn invalidate_ride(&self, id: &RideId) {
        self.invalidate(&[CacheKey::ride(id), CacheKey::rides_all()])
            .await;
    }

    /// Invalidate every key that could hold a stale view of a booking.
    pub async fn invalidate_booking(&self, id: &BookingId) {
        self.invalidate(&[CacheKey::booking(id), CacheKey::bookings_all()])
            .await;
    }

    /// Invalidate every key that could hold a stale view of a payment.
    pub async fn invalidate_payment(&self, id: &PaymentId) {
        self.invalidate(&[CacheKey::payment(id), CacheKey::payments_all()])
            .await;
    }

    /// Invalidate every key that could hold a stale view of a user.
    pub async fn invalidate_user(&self, id: &UserId) {
        self.invalidate(&[CacheKey::user(id), CacheKey::users_all()])
            .await;
    }
}

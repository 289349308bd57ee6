//! Ride lifecycle service: creation and the status state machine.
//!
//! This service is the sole authority over ride status. A transition is one
//! conditional write at the store (`... where id = ? and status = expected`);
//! a write that matches zero rows means another transition won the race, and
//! the caller gets a `Conflict` instead of a silent success.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::cache_coordinator::CacheCoordinator;
use super::caller::Caller;
use super::error::DomainError;
use super::ids::RideId;
use super::notifications::NotificationDispatcher;
use super::ports::{
    CacheKey, DriverRepository, DriverRepositoryError, EVENT_RIDE_STATUS, RideRepository,
    RideRepositoryError, ride_room,
};
use super::ride::{GeoPoint, Ride, RideDraft, RidePatch, RideStatus};

fn map_ride_repo_error(error: RideRepositoryError) -> DomainError {
    match error {
        RideRepositoryError::Connection { message } => {
            DomainError::internal(format!("ride store unavailable: {message}"))
        }
        RideRepositoryError::Query { message } => {
            DomainError::internal(format!("ride store error: {message}"))
        }
    }
}

fn map_driver_repo_error(error: DriverRepositoryError) -> DomainError {
    match error {
        DriverRepositoryError::Connection { message } => {
            DomainError::internal(format!("driver store unavailable: {message}"))
        }
        DriverRepositoryError::Query { message } => {
            DomainError::internal(format!("driver store error: {message}"))
        }
    }
}

/// Input for creating a ride. The vehicle is resolved from the driver.
#[derive(Debug, Clone)]
pub struct CreateRideRequest {
    pub driver: super::ids::DriverId,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub distance: f64,
    pub estimated_time: f64,
    pub price: f64,
}

/// Owns ride creation, reads, partial updates, and status transitions.
#[derive(Clone)]
pub struct RideLifecycle {
    rides: Arc<dyn RideRepository>,
    drivers: Arc<dyn DriverRepository>,
    cache: CacheCoordinator,
    dispatcher: NotificationDispatcher,
}

impl RideLifecycle {
    /// Create the service with its store, cache, and publish handles.
    pub fn new(
        rides: Arc<dyn RideRepository>,
        drivers: Arc<dyn DriverRepository>,
        cache: CacheCoordinator,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            rides,
            drivers,
            cache,
            dispatcher,
        }
    }

    /// Create a ride for the calling rider against a verified driver.
    pub async fn create_ride(
        &self,
        caller: &Caller,
        request: CreateRideRequest,
    ) -> Result<Ride, DomainError> {
        if !caller.is_rider {
            return Err(DomainError::forbidden("caller is not a rider"));
        }

        let driver = self
            .drivers
            .find_by_id(&request.driver)
            .await
            .map_err(map_driver_repo_error)?
            .ok_or_else(|| DomainError::not_found(format!("driver {} not found", request.driver)))?;

        if !driver.is_license_number_verified {
            return Err(DomainError::invalid_argument(
                "driver licence is not verified, ride cannot be created",
            )
            .with_field("driver"));
        }

        let now = Utc::now();
        let ride = Ride::new(RideDraft {
            id: RideId::random(),
            driver_id: driver.id,
            vehicle_id: driver.vehicle_id,
            rider_id: caller.id,
            origin: request.origin,
            destination: request.destination,
            distance: request.distance,
            estimated_time: request.estimated_time,
            price: request.price,
            status: RideStatus::Pending,
            created_at: now,
            updated_at: now,
        })
        .map_err(|err| DomainError::invalid_argument(err.to_string()).with_field(err.field()))?;

        self.rides.insert(&ride).await.map_err(map_ride_repo_error)?;
        self.cache.invalidate_ride(ride.id()).await;
        Ok(ride)
    }

    /// Move a ride along the allowed status graph.
    ///
    /// Fails with `Conflict` for a disallowed edge, and with `Conflict`
    /// (stale state) when the conditional write matches zero rows because a
    /// concurrent transition got there first — the caller must re-read and
    /// decide, never retry blindly.
    pub async fn transition(&self, id: &RideId, target: RideStatus) -> Result<Ride, DomainError> {
        let current = self.fetch(id).await?;
        let from = current.status();

        if !from.allows_transition_to(target) {
            return Err(DomainError::conflict(format!(
                "invalid ride status transition: {from} -> {target}"
            ))
            .with_details(json!({
                "code": "invalid_transition",
                "from": from,
                "to": target,
            })));
        }

        let updated = self
            .rides
            .transition_status(id, from, target)
            .await
            .map_err(map_ride_repo_error)?
            .ok_or_else(|| {
                DomainError::conflict(format!(
                    "ride {id} changed status concurrently, re-read and resubmit"
                ))
                .with_details(json!({
                    "code": "stale_state",
                    "expected": from,
                }))
            })?;

        info!(ride = %id, from = %from, to = %target, "ride status transitioned");
        self.cache.invalidate_ride(id).await;
        self.dispatcher
            .publish(
                &ride_room(id),
                EVENT_RIDE_STATUS,
                json!({ "rideId": id, "status": target }),
            )
            .await;
        Ok(updated)
    }

    /// Read a ride straight from the store, mapping absence to `NotFound`.
    pub(crate) async fn fetch(&self, id: &RideId) -> Result<Ride, DomainError> {
        self.rides
            .find_by_id(id)
            .await
            .map_err(map_ride_repo_error)?
            .ok_or_else(|| DomainError::not_found(format!("ride {id} not found")))
    }

    /// Read a ride through the cache.
    pub async fn get_ride(&self, id: &RideId) -> Result<Ride, DomainError> {
        self.cache
            .get_or_populate(CacheKey::ride(id), || self.fetch(id))
            .await
    }

    /// List every ride through the cache. Admin only.
    pub async fn list_rides(&self, caller: &Caller) -> Result<Vec<Ride>, DomainError> {
        if !caller.is_admin {
            return Err(DomainError::forbidden("only an admin can list rides"));
        }
        self.cache
            .get_or_populate(CacheKey::rides_all(), || async {
                self.rides.list_all().await.map_err(map_ride_repo_error)
            })
            .await
    }

    /// Patch a ride's trip fields. Terminal rides are immutable.
    pub async fn update_ride(&self, id: &RideId, patch: &RidePatch) -> Result<Ride, DomainError> {
        if patch.is_empty() {
            return Err(DomainError::invalid_argument("update contains no fields"));
        }
        patch
            .validate()
            .map_err(|err| DomainError::invalid_argument(err.to_string()).with_field(err.field()))?;

        let current = self.fetch(id).await?;
        if current.status().is_terminal() {
            return Err(DomainError::conflict(format!(
                "ride {id} is {} and can no longer change",
                current.status()
            )));
        }

        let updated = self
            .rides
            .update(id, patch)
            .await
            .map_err(map_ride_repo_error)?
            .ok_or_else(|| DomainError::not_found(format!("ride {id} not found")))?;

        self.cache.invalidate_ride(id).await;
        Ok(updated)
    }

    /// Delete a ride.
    pub async fn delete_ride(&self, id: &RideId) -> Result<(), DomainError> {
        let removed = self.rides.delete(id).await.map_err(map_ride_repo_error)?;
        if !removed {
            return Err(DomainError::not_found(format!(
                "ride {id} not found or already deleted"
            )));
        }
        self.cache.invalidate_ride(id).await;
        Ok(())
    }
}

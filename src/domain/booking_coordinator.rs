//! Booking admission: a driver answering a pending ride.
//!
//! Admission runs its gates in a fixed order (role, input shape, ride
//! availability) so that a request failing several of them always reports
//! the same error. The booking's owner is the ride's rider, never the
//! calling driver.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::booking::{Booking, BookingDraft, BookingPatch, BookingStatus, PaymentState};
use super::cache_coordinator::CacheCoordinator;
use super::caller::Caller;
use super::error::DomainError;
use super::ids::{BookingId, RideId};
use super::notifications::NotificationDispatcher;
use super::ports::{
    BookingRepository, BookingRepositoryError, CacheKey, EVENT_BOOKING_ACCEPTED, UserRepository,
    UserRepositoryError, ride_room,
};
use super::ride::{Ride, RideStatus};
use super::ride_lifecycle::RideLifecycle;

fn map_booking_repo_error(error: BookingRepositoryError) -> DomainError {
    match error {
        BookingRepositoryError::Connection { message } => {
            DomainError::internal(format!("booking store unavailable: {message}"))
        }
        BookingRepositoryError::Query { message } => {
            DomainError::internal(format!("booking store error: {message}"))
        }
    }
}

fn map_user_repo_error(error: UserRepositoryError) -> DomainError {
    match error {
        UserRepositoryError::Connection { message } => {
            DomainError::internal(format!("user store unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            DomainError::internal(format!("user store error: {message}"))
        }
    }
}

/// A driver's answer to a pending ride.
#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub ride: RideId,
    pub status: BookingStatus,
    pub fare: f64,
    pub payment_status: PaymentState,
}

/// What admission produced.
///
/// A cancellation records no booking: the ride is moved to `cancelled` and
/// returned on its own.
#[derive(Debug, Clone)]
pub enum CreateBookingOutcome {
    Booked { booking: Booking, ride: Ride },
    RideCancelled { ride: Ride },
}

/// Admits driver answers against pending rides and owns booking CRUD.
#[derive(Clone)]
pub struct BookingCoordinator {
    bookings: Arc<dyn BookingRepository>,
    users: Arc<dyn UserRepository>,
    lifecycle: RideLifecycle,
    cache: CacheCoordinator,
    dispatcher: NotificationDispatcher,
}

impl BookingCoordinator {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        users: Arc<dyn UserRepository>,
        lifecycle: RideLifecycle,
        cache: CacheCoordinator,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            bookings,
            users,
            lifecycle,
            cache,
            dispatcher,
        }
    }

    /// Admit a driver's answer to a ride.
    ///
    /// Only one answer can win a pending ride: an accepted booking rides on
    /// the `pending -> in-progress` transition, whose conditional write
    /// turns every concurrent second acceptance into a `Conflict` before a
    /// booking row exists for it.
    pub async fn create_booking(
        &self,
        caller: &Caller,
        request: CreateBookingRequest,
    ) -> Result<CreateBookingOutcome, DomainError> {
        if !caller.is_driver {
            return Err(DomainError::forbidden("caller is not a driver"));
        }
        if !request.fare.is_finite() || request.fare <= 0.0 {
            return Err(DomainError::invalid_argument(format!(
                "fare must be a positive number, got {}",
                request.fare
            ))
            .with_field("fare"));
        }
        if !request.payment_status.allowed_on_booking_input() {
            return Err(DomainError::invalid_argument(format!(
                "payment status {} is not accepted on a booking",
                request.payment_status
            ))
            .with_field("paymentStatus"));
        }

        let ride = self.lifecycle.fetch(&request.ride).await?;
        let rider = self
            .users
            .find_by_id(ride.rider_id())
            .await
            .map_err(map_user_repo_error)?
            .ok_or_else(|| {
                DomainError::not_found(format!("rider {} not found", ride.rider_id()))
            })?;

        // An acceptance claims the pending slot, so a ride already underway
        // is not available to it. The non-transitioning answers may still
        // land while the ride is in progress.
        let acceptable = match request.status {
            BookingStatus::Accepted => ride.status() == RideStatus::Pending,
            _ => ride.status().is_bookable(),
        };
        if !acceptable {
            return Err(DomainError::conflict(format!(
                "ride {} is {} and not available for booking",
                ride.id(),
                ride.status()
            )));
        }

        // The ride transition carries the race: it succeeds for exactly one
        // concurrent answer.
        let ride = match request.status {
            BookingStatus::Accepted => {
                self.lifecycle
                    .transition(&request.ride, RideStatus::InProgress)
                    .await?
            }
            BookingStatus::Cancelled => {
                let ride = self
                    .lifecycle
                    .transition(&request.ride, RideStatus::Cancelled)
                    .await?;
                info!(ride = %ride.id(), "ride cancelled by driver answer, no booking recorded");
                return Ok(CreateBookingOutcome::RideCancelled { ride });
            }
            BookingStatus::Rejected | BookingStatus::Completed => ride,
        };

        let now = Utc::now();
        let booking = Booking::new(BookingDraft {
            id: BookingId::random(),
            rider_id: rider.id,
            ride_id: *ride.id(),
            status: request.status,
            fare: request.fare,
            payment_status: request.payment_status,
            created_at: now,
            updated_at: now,
        })
        .map_err(|err| DomainError::invalid_argument(err.to_string()).with_field(err.field()))?;

        self.bookings
            .insert(&booking)
            .await
            .map_err(map_booking_repo_error)?;
        self.cache.invalidate_booking(booking.id()).await;

        if booking.status() == BookingStatus::Accepted {
            self.dispatcher
                .publish(
                    &ride_room(ride.id()),
                    EVENT_BOOKING_ACCEPTED,
                    json!({
                        "bookingId": booking.id(),
                        "rideId": ride.id(),
                        "fare": booking.fare(),
                    }),
                )
                .await;
        }
        Ok(CreateBookingOutcome::Booked { booking, ride })
    }

    /// Read a booking through the cache.
    pub async fn get_booking(&self, id: &BookingId) -> Result<Booking, DomainError> {
        self.cache
            .get_or_populate(CacheKey::booking(id), || self.fetch(id))
            .await
    }

    /// List every booking through the cache. Admin only.
    pub async fn list_bookings(&self, caller: &Caller) -> Result<Vec<Booking>, DomainError> {
        if !caller.is_admin {
            return Err(DomainError::forbidden("only an admin can list bookings"));
        }
        self.cache
            .get_or_populate(CacheKey::bookings_all(), || async {
                self.bookings
                    .list_all()
                    .await
                    .map_err(map_booking_repo_error)
            })
            .await
    }

    /// Patch a booking's mutable fields.
    pub async fn update_booking(
        &self,
        id: &BookingId,
        patch: &BookingPatch,
    ) -> Result<Booking, DomainError> {
        if patch.is_empty() {
            return Err(DomainError::invalid_argument("update contains no fields"));
        }
        if let Some(fare) = patch.fare {
            if !fare.is_finite() || fare <= 0.0 {
                return Err(DomainError::invalid_argument(format!(
                    "fare must be a positive number, got {fare}"
                ))
                .with_field("fare"));
            }
        }

        let updated = self
            .bookings
            .update(id, patch)
            .await
            .map_err(map_booking_repo_error)?
            .ok_or_else(|| DomainError::not_found(format!("booking {id} not found")))?;

        self.cache.invalidate_booking(id).await;
        Ok(updated)
    }

    /// Delete a booking.
    pub async fn delete_booking(&self, id: &BookingId) -> Result<(), DomainError> {
        let removed = self
            .bookings
            .delete(id)
            .await
            .map_err(map_booking_repo_error)?;
        if !removed {
            return Err(DomainError::not_found(format!(
                "booking {id} not found or already deleted"
            )));
        }
        self.cache.invalidate_booking(id).await;
        Ok(())
    }

    pub(crate) async fn fetch(&self, id: &BookingId) -> Result<Booking, DomainError> {
        self.bookings
            .find_by_id(id)
            .await
            .map_err(map_booking_repo_error)?
            .ok_or_else(|| DomainError::not_found(format!("booking {id} not found")))
    }
}

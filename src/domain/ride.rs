//! Ride aggregate and its status state machine.
//!
//! ## Invariants
//! - Status moves only along the allowed graph: `pending -> in-progress`,
//!   `pending -> cancelled`, `in-progress -> cancelled`,
//!   `in-progress -> completed`.
//! - Once `completed` or `cancelled` the ride is immutable.
//! - Distance, estimated time and price are finite and non-negative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::{DriverId, RideId, UserId, VehicleId};

/// WGS84 point; the wire format of the original system is a GeoJSON `Point`
/// with `[longitude, latitude]` coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

/// Ride status; serialised with the original wire names
/// (`pending`, `in-progress`, `completed`, `cancelled`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RideStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// Raised when decoding an unrecognised stored status string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ride status: {value}")]
pub struct UnknownRideStatus {
    pub value: String,
}

impl RideStatus {
    /// Stable wire/storage name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the ride can never change status again.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the status may be accepted as a booking target ride state.
    pub const fn is_bookable(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// The allowed transition graph.
    pub const fn allows_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::InProgress)
                | (Self::Pending, Self::Cancelled)
                | (Self::InProgress, Self::Cancelled)
                | (Self::InProgress, Self::Completed)
        )
    }
}

impl std::str::FromStr for RideStatus {
    type Err = UnknownRideStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownRideStatus {
                value: other.to_owned(),
            }),
        }
    }
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors raised by [`Ride::new`] and [`RidePatch::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RideValidationError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must not be negative")]
    Negative { field: &'static str },
}

impl RideValidationError {
    /// The offending input field.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::NotFinite { field } | Self::Negative { field } => field,
        }
    }
}

fn check_metric(field: &'static str, value: f64) -> Result<(), RideValidationError> {
    if !value.is_finite() {
        return Err(RideValidationError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(RideValidationError::Negative { field });
    }
    Ok(())
}

/// Unvalidated ride fields consumed by [`Ride::new`].
#[derive(Debug, Clone)]
pub struct RideDraft {
    pub id: RideId,
    pub driver_id: DriverId,
    pub vehicle_id: VehicleId,
    pub rider_id: UserId,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub distance: f64,
    pub estimated_time: f64,
    pub price: f64,
    pub status: RideStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A requested trip from origin to destination, owned by a rider and
/// assigned to a driver and vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    id: RideId,
    driver_id: DriverId,
    vehicle_id: VehicleId,
    rider_id: UserId,
    origin: GeoPoint,
    destination: GeoPoint,
    distance: f64,
    estimated_time: f64,
    price: f64,
    status: RideStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Ride {
    /// Validate and construct a ride.
    pub fn new(draft: RideDraft) -> Result<Self, RideValidationError> {
        check_metric("distance", draft.distance)?;
        check_metric("estimatedTime", draft.estimated_time)?;
        check_metric("price", draft.price)?;

        let RideDraft {
            id,
            driver_id,
            vehicle_id,
            rider_id,
            origin,
            destination,
            distance,
            estimated_time,
            price,
            status,
            created_at,
            updated_at,
        } = draft;

        Ok(Self {
            id,
            driver_id,
            vehicle_id,
            rider_id,
            origin,
            destination,
            distance,
            estimated_time,
            price,
            status,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> &RideId {
        &self.id
    }

    pub fn driver_id(&self) -> &DriverId {
        &self.driver_id
    }

    pub fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    /// The rider who requested the ride; bookings are owned by this user.
    pub fn rider_id(&self) -> &UserId {
        &self.rider_id
    }

    pub fn origin(&self) -> &GeoPoint {
        &self.origin
    }

    pub fn destination(&self) -> &GeoPoint {
        &self.destination
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn estimated_time(&self) -> f64 {
        self.estimated_time
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn status(&self) -> RideStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a patch in place. Callers must have validated the patch.
    pub(crate) fn apply_patch(&mut self, patch: &RidePatch, now: DateTime<Utc>) {
        if let Some(origin) = patch.origin {
            self.origin = origin;
        }
        if let Some(destination) = patch.destination {
            self.destination = destination;
        }
        if let Some(distance) = patch.distance {
            self.distance = distance;
        }
        if let Some(estimated_time) = patch.estimated_time {
            self.estimated_time = estimated_time;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        self.updated_at = now;
    }

    /// Set the status directly. Only the lifecycle and the store adapters'
    /// conditional writes go through here.
    pub(crate) fn set_status(&mut self, status: RideStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }
}

/// Partial update for a ride. Status is deliberately absent: transitions go
/// through the lifecycle's conditional write only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RidePatch {
    pub origin: Option<GeoPoint>,
    pub destination: Option<GeoPoint>,
    pub distance: Option<f64>,
    pub estimated_time: Option<f64>,
    pub price: Option<f64>,
}

impl RidePatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.origin.is_none()
            && self.destination.is_none()
            && self.distance.is_none()
            && self.estimated_time.is_none()
            && self.price.is_none()
    }

    /// Check the numeric fields the patch carries.
    pub fn validate(&self) -> Result<(), RideValidationError> {
        if let Some(distance) = self.distance {
            check_metric("distance", distance)?;
        }
        if let Some(estimated_time) = self.estimated_time {
            check_metric("estimatedTime", estimated_time)?;
        }
        if let Some(price) = self.price {
            check_metric("price", price)?;
        }
        Ok(())
    }
}

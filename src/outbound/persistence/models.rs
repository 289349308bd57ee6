//! Internal Diesel row structs and their domain conversions.
//!
//! These types exist to satisfy Diesel's requirements and never cross the
//! port boundary. Status columns are stored as their wire strings; decoding
//! an unknown value is a query-level error, not a panic.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::domain::{
    Booking, BookingDraft, BookingId, Driver, DriverId, GeoPoint, Payment, PaymentDraft,
    PaymentId, PaymentMethodId, Ride, RideDraft, RideId, User, UserId, VehicleId,
};

use super::schema::{bookings, drivers, payments, rides, users};

fn geo_to_json(point: &GeoPoint) -> serde_json::Value {
    json!({ "longitude": point.longitude, "latitude": point.latitude })
}

fn geo_from_json(value: serde_json::Value) -> Result<GeoPoint, String> {
    serde_json::from_value(value).map_err(|err| format!("malformed coordinate column: {err}"))
}

// ---------------------------------------------------------------------------
// users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub is_driver: bool,
    pub is_rider: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_domain(self) -> User {
        User {
            id: UserId::from_uuid(self.id),
            name: self.name,
            email: self.email,
            is_admin: self.is_admin,
            is_driver: self.is_driver,
            is_rider: self.is_rider,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Changeset for profile updates. `None` fields are left untouched;
/// `updated_at` always moves.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChanges<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// drivers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = drivers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DriverRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub license_number: String,
    pub vehicle_id: Uuid,
    pub rating: f64,
    pub rides_completed: i64,
    pub is_license_number_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DriverRow {
    pub(crate) fn into_domain(self) -> Driver {
        Driver {
            id: DriverId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            license_number: self.license_number,
            vehicle_id: VehicleId::from_uuid(self.vehicle_id),
            rating: self.rating,
            rides_completed: self.rides_completed,
            is_license_number_verified: self.is_license_number_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// rides
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = rides)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RideRow {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub rider_id: Uuid,
    pub origin: serde_json::Value,
    pub destination: serde_json::Value,
    pub distance: f64,
    pub estimated_time: f64,
    pub price: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RideRow {
    pub(crate) fn into_domain(self) -> Result<Ride, String> {
        let status = self
            .status
            .parse()
            .map_err(|err: crate::domain::ride::UnknownRideStatus| err.to_string())?;
        Ride::new(RideDraft {
            id: RideId::from_uuid(self.id),
            driver_id: DriverId::from_uuid(self.driver_id),
            vehicle_id: VehicleId::from_uuid(self.vehicle_id),
            rider_id: UserId::from_uuid(self.rider_id),
            origin: geo_from_json(self.origin)?,
            destination: geo_from_json(self.destination)?,
            distance: self.distance,
            estimated_time: self.estimated_time,
            price: self.price,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(|err| format!("stored ride is invalid: {err}"))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = rides)]
pub(crate) struct NewRideRow {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub rider_id: Uuid,
    pub origin: serde_json::Value,
    pub destination: serde_json::Value,
    pub distance: f64,
    pub estimated_time: f64,
    pub price: f64,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewRideRow {
    pub(crate) fn from_domain(ride: &Ride) -> Self {
        Self {
            id: *ride.id().as_uuid(),
            driver_id: *ride.driver_id().as_uuid(),
            vehicle_id: *ride.vehicle_id().as_uuid(),
            rider_id: *ride.rider_id().as_uuid(),
            origin: geo_to_json(ride.origin()),
            destination: geo_to_json(ride.destination()),
            distance: ride.distance(),
            estimated_time: ride.estimated_time(),
            price: ride.price(),
            status: ride.status().as_str(),
            created_at: ride.created_at(),
            updated_at: ride.updated_at(),
        }
    }
}

/// Changeset for ride trip fields. Status never travels through here; the
/// conditional transition write owns that column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = rides)]
pub(crate) struct RideChanges {
    pub origin: Option<serde_json::Value>,
    pub destination: Option<serde_json::Value>,
    pub distance: Option<f64>,
    pub estimated_time: Option<f64>,
    pub price: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl RideChanges {
    pub(crate) fn from_patch(patch: &crate::domain::RidePatch, now: DateTime<Utc>) -> Self {
        Self {
            origin: patch.origin.as_ref().map(geo_to_json),
            destination: patch.destination.as_ref().map(geo_to_json),
            distance: patch.distance,
            estimated_time: patch.estimated_time,
            price: patch.price,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// bookings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub ride_id: Uuid,
    pub status: String,
    pub fare: f64,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRow {
    pub(crate) fn into_domain(self) -> Result<Booking, String> {
        let status = self
            .status
            .parse()
            .map_err(|err: crate::domain::booking::UnknownBookingStatus| err.to_string())?;
        let payment_status = self
            .payment_status
            .parse()
            .map_err(|err: crate::domain::booking::UnknownPaymentState| err.to_string())?;
        Booking::new(BookingDraft {
            id: BookingId::from_uuid(self.id),
            rider_id: UserId::from_uuid(self.rider_id),
            ride_id: RideId::from_uuid(self.ride_id),
            status,
            fare: self.fare,
            payment_status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(|err| format!("stored booking is invalid: {err}"))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub(crate) struct NewBookingRow {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub ride_id: Uuid,
    pub status: &'static str,
    pub fare: f64,
    pub payment_status: &'static str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewBookingRow {
    pub(crate) fn from_domain(booking: &Booking) -> Self {
        Self {
            id: *booking.id().as_uuid(),
            rider_id: *booking.rider_id().as_uuid(),
            ride_id: *booking.ride_id().as_uuid(),
            status: booking.status().as_str(),
            fare: booking.fare(),
            payment_status: booking.payment_status().as_str(),
            created_at: booking.created_at(),
            updated_at: booking.updated_at(),
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = bookings)]
pub(crate) struct BookingChanges {
    pub status: Option<&'static str>,
    pub fare: Option<f64>,
    pub payment_status: Option<&'static str>,
    pub updated_at: DateTime<Utc>,
}

impl BookingChanges {
    pub(crate) fn from_patch(patch: &crate::domain::BookingPatch, now: DateTime<Utc>) -> Self {
        Self {
            status: patch.status.map(|status| status.as_str()),
            fare: patch.fare,
            payment_status: patch.payment_status.map(|state| state.as_str()),
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// payments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentRow {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub booking_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub payment_method_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRow {
    pub(crate) fn into_domain(self) -> Result<Payment, String> {
        let status = self
            .status
            .parse()
            .map_err(|err: crate::domain::booking::UnknownPaymentState| err.to_string())?;
        Payment::new(PaymentDraft {
            id: PaymentId::from_uuid(self.id),
            rider_id: UserId::from_uuid(self.rider_id),
            booking_id: BookingId::from_uuid(self.booking_id),
            amount: self.amount,
            currency: self.currency,
            payment_method_id: PaymentMethodId::from_uuid(self.payment_method_id),
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(|err| format!("stored payment is invalid: {err}"))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub(crate) struct NewPaymentRow<'a> {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub booking_id: Uuid,
    pub amount: f64,
    pub currency: &'a str,
    pub payment_method_id: Uuid,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> NewPaymentRow<'a> {
    pub(crate) fn from_domain(payment: &'a Payment) -> Self {
        Self {
            id: *payment.id().as_uuid(),
            rider_id: *payment.rider_id().as_uuid(),
            booking_id: *payment.booking_id().as_uuid(),
            amount: payment.amount(),
            currency: payment.currency(),
            payment_method_id: *payment.payment_method_id().as_uuid(),
            status: payment.status().as_str(),
            created_at: payment.created_at(),
            updated_at: payment.updated_at(),
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = payments)]
pub(crate) struct PaymentChanges<'a> {
    pub amount: Option<f64>,
    pub currency: Option<&'a str>,
    pub status: Option<&'static str>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> PaymentChanges<'a> {
    pub(crate) fn from_patch(patch: &'a crate::domain::PaymentPatch, now: DateTime<Utc>) -> Self {
        Self {
            amount: patch.amount,
            currency: patch.currency.as_deref(),
            status: patch.status.map(|state| state.as_str()),
            updated_at: now,
        }
    }
}

//! Booking aggregate.
//!
//! ## Invariants
//! - `fare` is finite and strictly positive.
//! - At most one *accepted* booking exists per ride; this is enforced by the
//!   coordinator's conditional ride transition, not by the type.
//! - A booking's ride reference pointed at a `pending` or `in-progress` ride
//!   at creation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::{BookingId, RideId, UserId};

/// Booking status requested by the accepting driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Accepted,
    Rejected,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Stable wire/storage name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

/// Raised when decoding an unrecognised stored status string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown booking status: {value}")]
pub struct UnknownBookingStatus {
    pub value: String,
}

impl std::str::FromStr for BookingStatus {
    type Err = UnknownBookingStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownBookingStatus {
                value: other.to_owned(),
            }),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state shared by `Booking.payment_status` and `Payment.status`.
///
/// Settlement maps `Payment.status` onto the booking one-to-one, so the two
/// deliberately share a single enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Unpaid,
    Paid,
    Refunded,
    Pending,
}

impl PaymentState {
    /// Stable wire/storage name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
            Self::Pending => "pending",
        }
    }

    /// States a driver may submit on a new booking. `pending` is reserved
    /// for settlement.
    pub const fn allowed_on_booking_input(self) -> bool {
        matches!(self, Self::Unpaid | Self::Paid | Self::Refunded)
    }
}

/// Raised when decoding an unrecognised stored payment state string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment state: {value}")]
pub struct UnknownPaymentState {
    pub value: String,
}

impl std::str::FromStr for PaymentState {
    type Err = UnknownPaymentState;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "refunded" => Ok(Self::Refunded),
            "pending" => Ok(Self::Pending),
            other => Err(UnknownPaymentState {
                value: other.to_owned(),
            }),
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors raised by [`Booking::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BookingValidationError {
    #[error("fare must be a positive number, got {fare}")]
    NonPositiveFare { fare: f64 },
}

impl BookingValidationError {
    /// The offending input field.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::NonPositiveFare { .. } => "fare",
        }
    }
}

/// Unvalidated booking fields consumed by [`Booking::new`].
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub id: BookingId,
    pub rider_id: UserId,
    pub ride_id: RideId,
    pub status: BookingStatus,
    pub fare: f64,
    pub payment_status: PaymentState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A driver's admission of a ride request. Owned by the ride's rider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    id: BookingId,
    rider_id: UserId,
    ride_id: RideId,
    status: BookingStatus,
    fare: f64,
    payment_status: PaymentState,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Booking {
    /// Validate and construct a booking.
    pub fn new(draft: BookingDraft) -> Result<Self, BookingValidationError> {
        if !draft.fare.is_finite() || draft.fare <= 0.0 {
            return Err(BookingValidationError::NonPositiveFare { fare: draft.fare });
        }

        let BookingDraft {
            id,
            rider_id,
            ride_id,
            status,
            fare,
            payment_status,
            created_at,
            updated_at,
        } = draft;

        Ok(Self {
            id,
            rider_id,
            ride_id,
            status,
            fare,
            payment_status,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> &BookingId {
        &self.id
    }

    /// The ride's rider, not the driver who created the booking.
    pub fn rider_id(&self) -> &UserId {
        &self.rider_id
    }

    pub fn ride_id(&self) -> &RideId {
        &self.ride_id
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn fare(&self) -> f64 {
        self.fare
    }

    pub fn payment_status(&self) -> PaymentState {
        self.payment_status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a patch in place. Callers must have validated the patch.
    pub(crate) fn apply_patch(&mut self, patch: &BookingPatch, now: DateTime<Utc>) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(fare) = patch.fare {
            self.fare = fare;
        }
        if let Some(payment_status) = patch.payment_status {
            self.payment_status = payment_status;
        }
        self.updated_at = now;
    }

    /// Settlement's single-field write.
    pub(crate) fn set_payment_status(&mut self, state: PaymentState, now: DateTime<Utc>) {
        self.payment_status = state;
        self.updated_at = now;
    }
}

/// Partial update for a booking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPatch {
    pub status: Option<BookingStatus>,
    pub fare: Option<f64>,
    pub payment_status: Option<PaymentState>,
}

impl BookingPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.fare.is_none() && self.payment_status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn draft(fare: f64) -> BookingDraft {
        let now = Utc::now();
        BookingDraft {
            id: BookingId::random(),
            rider_id: UserId::random(),
            ride_id: RideId::random(),
            status: BookingStatus::Accepted,
            fare,
            payment_status: PaymentState::Unpaid,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(-5.0)]
    #[case(f64::NAN)]
    fn non_positive_fare_is_rejected(#[case] fare: f64) {
        let err = Booking::new(draft(fare)).expect_err("fare rejected");
        assert_eq!(err.field(), "fare");
    }

    #[rstest]
    fn positive_fare_is_accepted() {
        let booking = Booking::new(draft(10.0)).expect("valid booking");
        assert_eq!(booking.fare(), 10.0);
        assert_eq!(booking.payment_status(), PaymentState::Unpaid);
    }

    #[rstest]
    #[case(PaymentState::Unpaid, true)]
    #[case(PaymentState::Paid, true)]
    #[case(PaymentState::Refunded, true)]
    #[case(PaymentState::Pending, false)]
    fn booking_input_payment_states(#[case] state: PaymentState, #[case] allowed: bool) {
        assert_eq!(state.allowed_on_booking_input(), allowed);
    }

    #[rstest]
    fn statuses_round_trip_through_wire_names() {
        for status in [
            BookingStatus::Accepted,
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            let parsed: BookingStatus = status.as_str().parse().expect("status parses");
            assert_eq!(parsed, status);
        }
        for state in [
            PaymentState::Unpaid,
            PaymentState::Paid,
            PaymentState::Refunded,
            PaymentState::Pending,
        ] {
            let parsed: PaymentState = state.as_str().parse().expect("state parses");
            assert_eq!(parsed, state);
        }
    }
}

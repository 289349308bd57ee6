//! Port for booking persistence.

use async_trait::async_trait;

use crate::domain::booking::{Booking, BookingPatch, PaymentState};
use crate::domain::ids::BookingId;

/// Errors raised by booking store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingRepositoryError {
    /// Store connection could not be established.
    #[error("booking store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("booking store query failed: {message}")]
    Query { message: String },
}

impl BookingRepositoryError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Port for reading and writing bookings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Find a booking by id.
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, BookingRepositoryError>;

    /// List every booking.
    async fn list_all(&self) -> Result<Vec<Booking>, BookingRepositoryError>;

    /// Persist a new booking.
    async fn insert(&self, booking: &Booking) -> Result<(), BookingRepositoryError>;

    /// Apply the patch to an existing booking; `None` when absent.
    async fn update(
        &self,
        id: &BookingId,
        patch: &BookingPatch,
    ) -> Result<Option<Booking>, BookingRepositoryError>;

    /// Delete a booking; `false` when nothing was removed.
    async fn delete(&self, id: &BookingId) -> Result<bool, BookingRepositoryError>;

    /// Settlement's single-field conditional write: set `payment_status`
    /// where the booking still exists. `None` when the booking is gone.
    async fn set_payment_status(
        &self,
        id: &BookingId,
        state: PaymentState,
    ) -> Result<Option<Booking>, BookingRepositoryError>;
}

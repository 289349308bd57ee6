//! Port for payment persistence.

use async_trait::async_trait;

use crate::domain::ids::{BookingId, PaymentId};
use crate::domain::payment::{Payment, PaymentPatch};

/// Errors raised by payment store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentRepositoryError {
    /// Store connection could not be established.
    #[error("payment store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("payment store query failed: {message}")]
    Query { message: String },
    /// The store's uniqueness constraint on the booking reference fired.
    /// This, not the application-level pre-check, is the invariant enforcer
    /// for "at most one payment per booking".
    #[error("a payment already exists for booking {booking_id}")]
    DuplicateBooking { booking_id: BookingId },
}

impl PaymentRepositoryError {
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

/// Port for reading and writing payments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Find a payment by id.
    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, PaymentRepositoryError>;

    /// List every payment.
    async fn list_all(&self) -> Result<Vec<Payment>, PaymentRepositoryError>;

    /// Find the payment settled against a booking, if any.
    async fn find_by_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Payment>, PaymentRepositoryError>;

    /// Persist a new payment. A concurrent duplicate for the same booking
    /// surfaces as [`PaymentRepositoryError::DuplicateBooking`].
    async fn insert(&self, payment: &Payment) -> Result<(), PaymentRepositoryError>;

    /// Apply the patch to an existing payment; `None` when absent.
    async fn update(
        &self,
        id: &PaymentId,
        patch: &PaymentPatch,
    ) -> Result<Option<Payment>, PaymentRepositoryError>;

    /// Delete a payment; `false` when nothing was removed.
    async fn delete(&self, id: &PaymentId) -> Result<bool, PaymentRepositoryError>;
}

//! Payment settlement: one payment per booking, mirrored onto the booking.
//!
//! Uniqueness is enforced twice: a pre-check turns the common duplicate into
//! a clean `Conflict`, and the store's unique constraint on the booking
//! column catches the race the pre-check cannot see. Both paths produce the
//! same error, so callers cannot tell which gate fired.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use super::booking::{Booking, PaymentState};
use super::cache_coordinator::CacheCoordinator;
use super::caller::Caller;
use super::error::DomainError;
use super::ids::{BookingId, PaymentId, PaymentMethodId};
use super::notifications::NotificationDispatcher;
use super::ports::{
    BookingRepository, BookingRepositoryError, CacheKey, EVENT_PAYMENT_SETTLED,
    PaymentRepository, PaymentRepositoryError, ride_room,
};
use super::payment::{Payment, PaymentDraft, PaymentPatch};

fn map_payment_repo_error(error: PaymentRepositoryError) -> DomainError {
    match error {
        PaymentRepositoryError::Connection { message } => {
            DomainError::internal(format!("payment store unavailable: {message}"))
        }
        PaymentRepositoryError::Query { message } => {
            DomainError::internal(format!("payment store error: {message}"))
        }
        PaymentRepositoryError::DuplicateBooking { booking_id } => {
            duplicate_booking_conflict(&booking_id)
        }
    }
}

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

fn duplicate_booking_conflict(booking_id: &BookingId) -> DomainError {
    DomainError::conflict(format!(
        "a payment already exists for booking {booking_id}"
    ))
    .with_details(json!({ "code": "duplicate_booking", "bookingId": booking_id }))
}

/// Input for settling a booking.
#[derive(Debug, Clone)]
pub struct CreatePaymentRequest {
    pub booking: BookingId,
    pub amount: f64,
    pub currency: String,
    pub payment_method: PaymentMethodId,
    pub status: PaymentState,
}

/// What settlement produced: the payment plus the booking it updated.
#[derive(Debug, Clone)]
pub struct SettlementReceipt {
    pub payment: Payment,
    pub booking: Booking,
}

/// Settles bookings with exactly one payment each and owns payment CRUD.
#[derive(Clone)]
pub struct PaymentSettlement {
    payments: Arc<dyn PaymentRepository>,
    bookings: Arc<dyn BookingRepository>,
    cache: CacheCoordinator,
    dispatcher: NotificationDispatcher,
}

impl PaymentSettlement {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        bookings: Arc<dyn BookingRepository>,
        cache: CacheCoordinator,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            payments,
            bookings,
            cache,
            dispatcher,
        }
    }

    /// Record a payment against a booking and mirror its status onto the
    /// booking's `payment_status`.
    ///
    /// A missing booking is an input error, an existing payment is a
    /// conflict. The payment row is written first; if the booking vanishes
    /// between the two writes the payment stays recorded and the caller gets
    /// a `Conflict` to resolve by hand.
    pub async fn create_payment(
        &self,
        caller: &Caller,
        request: CreatePaymentRequest,
    ) -> Result<SettlementReceipt, DomainError> {
        let booking = self
            .bookings
            .find_by_id(&request.booking)
            .await
            .map_err(map_booking_repo_error)?
            .ok_or_else(|| {
                DomainError::invalid_argument(format!(
                    "booking {} does not exist",
                    request.booking
                ))
                .with_field("booking")
            })?;

        let existing = self
            .payments
            .find_by_booking(&request.booking)
            .await
            .map_err(map_payment_repo_error)?;
        if existing.is_some() {
            return Err(duplicate_booking_conflict(&request.booking));
        }

        let now = Utc::now();
        let payment = Payment::new(PaymentDraft {
            id: PaymentId::random(),
            rider_id: caller.id,
            booking_id: *booking.id(),
            amount: request.amount,
            currency: request.currency,
            payment_method_id: request.payment_method,
            status: request.status,
            created_at: now,
            updated_at: now,
        })
        .map_err(|err| DomainError::invalid_argument(err.to_string()).with_field(err.field()))?;

        // The unique constraint on the booking column closes the window the
        // pre-check leaves open.
        self.payments
            .insert(&payment)
            .await
            .map_err(map_payment_repo_error)?;

        let booking = self
            .bookings
            .set_payment_status(booking.id(), payment.status())
            .await
            .map_err(map_booking_repo_error)?
            .ok_or_else(|| {
                warn!(
                    payment = %payment.id(),
                    booking = %payment.booking_id(),
                    "booking disappeared after its payment was recorded"
                );
                DomainError::conflict(format!(
                    "booking {} was removed while its payment settled",
                    payment.booking_id()
                ))
            })?;

        info!(
            payment = %payment.id(),
            booking = %booking.id(),
            status = %payment.status(),
            "payment settled"
        );
        self.cache.invalidate_payment(payment.id()).await;
        self.cache.invalidate_booking(booking.id()).await;
        self.dispatcher
            .publish(
                &ride_room(booking.ride_id()),
                EVENT_PAYMENT_SETTLED,
                json!({
                    "paymentId": payment.id(),
                    "bookingId": booking.id(),
                    "status": payment.status(),
                }),
            )
            .await;
        Ok(SettlementReceipt { payment, booking })
    }

    /// Read a payment through the cache.
    pub async fn get_payment(&self, id: &PaymentId) -> Result<Payment, DomainError> {
        self.cache
            .get_or_populate(CacheKey::payment(id), || async {
                self.payments
                    .find_by_id(id)
                    .await
                    .map_err(map_payment_repo_error)?
                    .ok_or_else(|| DomainError::not_found(format!("payment {id} not found")))
            })
            .await
    }

    /// List every payment through the cache. Admin only.
    pub async fn list_payments(&self, caller: &Caller) -> Result<Vec<Payment>, DomainError> {
        if !caller.is_admin {
            return Err(DomainError::forbidden("only an admin can list payments"));
        }
        self.cache
            .get_or_populate(CacheKey::payments_all(), || async {
                self.payments
                    .list_all()
                    .await
                    .map_err(map_payment_repo_error)
            })
            .await
    }

    /// Patch a payment's mutable fields, mirroring a status change onto the
    /// booking.
    pub async fn update_payment(
        &self,
        id: &PaymentId,
        patch: &PaymentPatch,
    ) -> Result<Payment, DomainError> {
        if patch.is_empty() {
            return Err(DomainError::invalid_argument("update contains no fields"));
        }
        if let Some(amount) = patch.amount {
            if !amount.is_finite() || amount <= 0.0 {
                return Err(DomainError::invalid_argument(format!(
                    "amount must be a positive number, got {amount}"
                ))
                .with_field("amount"));
            }
        }
        if let Some(currency) = &patch.currency {
            if currency.trim().is_empty() {
                return Err(
                    DomainError::invalid_argument("currency must not be blank")
                        .with_field("currency"),
                );
            }
        }

        let updated = self
            .payments
            .update(id, patch)
            .await
            .map_err(map_payment_repo_error)?
            .ok_or_else(|| DomainError::not_found(format!("payment {id} not found")))?;

        self.cache.invalidate_payment(id).await;
        if let Some(status) = patch.status {
            if self
                .bookings
                .set_payment_status(updated.booking_id(), status)
                .await
                .map_err(map_booking_repo_error)?
                .is_some()
            {
                self.cache.invalidate_booking(updated.booking_id()).await;
            }
        }
        Ok(updated)
    }

    /// Delete a payment.
    pub async fn delete_payment(&self, id: &PaymentId) -> Result<(), DomainError> {
        let removed = self
            .payments
            .delete(id)
            .await
            .map_err(map_payment_repo_error)?;
        if !removed {
            return Err(DomainError::not_found(format!(
                "payment {id} not found or already deleted"
            )));
        }
        self.cache.invalidate_payment(id).await;
        Ok(())
    }
}

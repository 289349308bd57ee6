//! Payment aggregate.
//!
//! ## Invariants
//! - At most one payment exists per booking; the store enforces this with a
//!   uniqueness constraint on the booking reference.
//! - `amount` is finite and strictly positive; `currency` is non-blank.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::booking::PaymentState;
use super::ids::{BookingId, PaymentId, PaymentMethodId, UserId};

/// Validation errors raised by [`Payment::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentValidationError {
    #[error("amount must be a positive number, got {amount}")]
    NonPositiveAmount { amount: f64 },
    #[error("currency must not be blank")]
    BlankCurrency,
}

impl PaymentValidationError {
    /// The offending input field.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount { .. } => "amount",
            Self::BlankCurrency => "currency",
        }
    }
}

/// Unvalidated payment fields consumed by [`Payment::new`].
#[derive(Debug, Clone)]
pub struct PaymentDraft {
    pub id: PaymentId,
    pub rider_id: UserId,
    pub booking_id: BookingId,
    pub amount: f64,
    pub currency: String,
    pub payment_method_id: PaymentMethodId,
    pub status: PaymentState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A rider's settlement of a booking's fare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    id: PaymentId,
    rider_id: UserId,
    booking_id: BookingId,
    amount: f64,
    currency: String,
    payment_method_id: PaymentMethodId,
    status: PaymentState,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Payment {
    /// Validate and construct a payment.
    pub fn new(draft: PaymentDraft) -> Result<Self, PaymentValidationError> {
        if !draft.amount.is_finite() || draft.amount <= 0.0 {
            return Err(PaymentValidationError::NonPositiveAmount {
                amount: draft.amount,
            });
        }
        if draft.currency.trim().is_empty() {
            return Err(PaymentValidationError::BlankCurrency);
        }

        let PaymentDraft {
            id,
            rider_id,
            booking_id,
            amount,
            currency,
            payment_method_id,
            status,
            created_at,
            updated_at,
        } = draft;

        Ok(Self {
            id,
            rider_id,
            booking_id,
            amount,
            currency,
            payment_method_id,
            status,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> &PaymentId {
        &self.id
    }

    /// The rider who submitted the payment.
    pub fn rider_id(&self) -> &UserId {
        &self.rider_id
    }

    pub fn booking_id(&self) -> &BookingId {
        &self.booking_id
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn currency(&self) -> &str {
        self.currency.as_str()
    }

    pub fn payment_method_id(&self) -> &PaymentMethodId {
        &self.payment_method_id
    }

    pub fn status(&self) -> PaymentState {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a patch in place. Callers must have validated the patch.
    pub(crate) fn apply_patch(&mut self, patch: &PaymentPatch, now: DateTime<Utc>) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(currency) = &patch.currency {
            self.currency = currency.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now;
    }
}

/// Partial update for a payment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPatch {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub status: Option<PaymentState>,
}

impl PaymentPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.currency.is_none() && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn draft() -> PaymentDraft {
        let now = Utc::now();
        PaymentDraft {
            id: PaymentId::random(),
            rider_id: UserId::random(),
            booking_id: BookingId::random(),
            amount: 10.0,
            currency: "USD".to_owned(),
            payment_method_id: PaymentMethodId::random(),
            status: PaymentState::Paid,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::INFINITY)]
    fn non_positive_amount_is_rejected(#[case] amount: f64) {
        let mut bad = draft();
        bad.amount = amount;
        let err = Payment::new(bad).expect_err("amount rejected");
        assert_eq!(err.field(), "amount");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_currency_is_rejected(#[case] currency: &str) {
        let mut bad = draft();
        bad.currency = currency.to_owned();
        let err = Payment::new(bad).expect_err("currency rejected");
        assert_eq!(err.field(), "currency");
    }

    #[rstest]
    fn valid_payment_is_accepted() {
        let payment = Payment::new(draft()).expect("valid payment");
        assert_eq!(payment.currency(), "USD");
        assert_eq!(payment.status(), PaymentState::Paid);
    }
}

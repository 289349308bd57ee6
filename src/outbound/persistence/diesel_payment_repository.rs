//! PostgreSQL-backed `PaymentRepository` implementation using Diesel ORM.
//!
//! Inserts rely on the unique constraint over `payments.booking_id`: a
//! violation of that constraint maps to `DuplicateBooking` so settlement can
//! report a conflict even when two writers race past its pre-check.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{PaymentRepository, PaymentRepositoryError};
use crate::domain::{BookingId, Payment, PaymentId, PaymentPatch};

use super::error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{NewPaymentRow, PaymentChanges, PaymentRow};
use super::pool::DbPool;
use super::schema::payments;

/// Constraint created by the payments migration.
const BOOKING_UNIQUE_CONSTRAINT: &str = "payments_booking_id_key";

/// Diesel-backed implementation of the `PaymentRepository` port.
#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_db_error(error: diesel::result::Error) -> PaymentRepositoryError {
    map_diesel_error(
        error,
        PaymentRepositoryError::query,
        PaymentRepositoryError::connection,
    )
}

fn decode(row: PaymentRow) -> Result<Payment, PaymentRepositoryError> {
    row.into_domain().map_err(PaymentRepositoryError::query)
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, PaymentRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PaymentRepositoryError::connection))?;

        let row = payments::table
            .filter(payments::id.eq(id.as_uuid()))
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_db_error)?;

        row.map(decode).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Payment>, PaymentRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PaymentRepositoryError::connection))?;

        let rows = payments::table
            .order(payments::created_at.desc())
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(decode).collect()
    }

    async fn find_by_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Payment>, PaymentRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PaymentRepositoryError::connection))?;

        let row = payments::table
            .filter(payments::booking_id.eq(booking_id.as_uuid()))
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_db_error)?;

        row.map(decode).transpose()
    }

    async fn insert(&self, payment: &Payment) -> Result<(), PaymentRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PaymentRepositoryError::connection))?;

        diesel::insert_into(payments::table)
            .values(NewPaymentRow::from_domain(payment))
            .execute(&mut conn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err, BOOKING_UNIQUE_CONSTRAINT) {
                    PaymentRepositoryError::DuplicateBooking {
                        booking_id: *payment.booking_id(),
                    }
                } else {
                    map_db_error(err)
                }
            })?;
        Ok(())
    }

    async fn update(
        &self,
        id: &PaymentId,
        patch: &PaymentPatch,
    ) -> Result<Option<Payment>, PaymentRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PaymentRepositoryError::connection))?;

        let row = diesel::update(payments::table.filter(payments::id.eq(id.as_uuid())))
            .set(PaymentChanges::from_patch(patch, Utc::now()))
            .returning(PaymentRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_db_error)?;

        row.map(decode).transpose()
    }

    async fn delete(&self, id: &PaymentId) -> Result<bool, PaymentRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PaymentRepositoryError::connection))?;

        let deleted = diesel::delete(payments::table.filter(payments::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_db_error)?;
        Ok(deleted > 0)
    }
}

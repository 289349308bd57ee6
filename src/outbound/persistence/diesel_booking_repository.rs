//! PostgreSQL-backed `BookingRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{BookingRepository, BookingRepositoryError};
use crate::domain::{Booking, BookingId, BookingPatch, PaymentState};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{BookingChanges, BookingRow, NewBookingRow};
use super::pool::DbPool;
use super::schema::bookings;

/// Diesel-backed implementation of the `BookingRepository` port.
#[derive(Clone)]
pub struct DieselBookingRepository {
    pool: DbPool,
}

impl DieselBookingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_db_error(error: diesel::result::Error) -> BookingRepositoryError {
    map_diesel_error(
        error,
        BookingRepositoryError::query,
        BookingRepositoryError::connection,
    )
}

fn decode(row: BookingRow) -> Result<Booking, BookingRepositoryError> {
    row.into_domain().map_err(BookingRepositoryError::query)
}

#[async_trait]
impl BookingRepository for DieselBookingRepository {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, BookingRepositoryError::connection))?;

        let row = bookings::table
            .filter(bookings::id.eq(id.as_uuid()))
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_db_error)?;

        row.map(decode).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, BookingRepositoryError::connection))?;

        let rows = bookings::table
            .order(bookings::created_at.desc())
            .select(BookingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(decode).collect()
    }

    async fn insert(&self, booking: &Booking) -> Result<(), BookingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, BookingRepositoryError::connection))?;

        diesel::insert_into(bookings::table)
            .values(NewBookingRow::from_domain(booking))
            .execute(&mut conn)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn update(
        &self,
        id: &BookingId,
        patch: &BookingPatch,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, BookingRepositoryError::connection))?;

        let row = diesel::update(bookings::table.filter(bookings::id.eq(id.as_uuid())))
            .set(BookingChanges::from_patch(patch, Utc::now()))
            .returning(BookingRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_db_error)?;

        row.map(decode).transpose()
    }

    async fn delete(&self, id: &BookingId) -> Result<bool, BookingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, BookingRepositoryError::connection))?;

        let deleted = diesel::delete(bookings::table.filter(bookings::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_db_error)?;
        Ok(deleted > 0)
    }

    async fn set_payment_status(
        &self,
        id: &BookingId,
        state: PaymentState,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, BookingRepositoryError::connection))?;

        let row = diesel::update(bookings::table.filter(bookings::id.eq(id.as_uuid())))
            .set((
                bookings::payment_status.eq(state.as_str()),
                bookings::updated_at.eq(Utc::now()),
            ))
            .returning(BookingRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_db_error)?;

        row.map(decode).transpose()
    }
}

//! PostgreSQL-backed `RideRepository` implementation using Diesel ORM.
//!
//! The status transition is a single conditional `UPDATE ... WHERE id = ?
//! AND status = ?`. Zero matched rows means a concurrent transition won and
//! the port reports `None` so the service can surface a conflict.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RideRepository, RideRepositoryError};
use crate::domain::{Ride, RideId, RidePatch, RideStatus};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewRideRow, RideChanges, RideRow};
use super::pool::DbPool;
use super::schema::rides;

/// Diesel-backed implementation of the `RideRepository` port.
#[derive(Clone)]
pub struct DieselRideRepository {
    pool: DbPool,
}

impl DieselRideRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_db_error(error: diesel::result::Error) -> RideRepositoryError {
    map_diesel_error(
        error,
        RideRepositoryError::query,
        RideRepositoryError::connection,
    )
}

fn decode(row: RideRow) -> Result<Ride, RideRepositoryError> {
    row.into_domain().map_err(RideRepositoryError::query)
}

#[async_trait]
impl RideRepository for DieselRideRepository {
    async fn find_by_id(&self, id: &RideId) -> Result<Option<Ride>, RideRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RideRepositoryError::connection))?;

        let row = rides::table
            .filter(rides::id.eq(id.as_uuid()))
            .select(RideRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_db_error)?;

        row.map(decode).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Ride>, RideRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RideRepositoryError::connection))?;

        let rows = rides::table
            .order(rides::created_at.desc())
            .select(RideRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(decode).collect()
    }

    async fn insert(&self, ride: &Ride) -> Result<(), RideRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RideRepositoryError::connection))?;

        diesel::insert_into(rides::table)
            .values(NewRideRow::from_domain(ride))
            .execute(&mut conn)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn update(
        &self,
        id: &RideId,
        patch: &RidePatch,
    ) -> Result<Option<Ride>, RideRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RideRepositoryError::connection))?;

        let row = diesel::update(rides::table.filter(rides::id.eq(id.as_uuid())))
            .set(RideChanges::from_patch(patch, Utc::now()))
            .returning(RideRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_db_error)?;

        row.map(decode).transpose()
    }

    async fn delete(&self, id: &RideId) -> Result<bool, RideRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RideRepositoryError::connection))?;

        let deleted = diesel::delete(rides::table.filter(rides::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_db_error)?;
        Ok(deleted > 0)
    }

    async fn transition_status(
        &self,
        id: &RideId,
        expected: RideStatus,
        target: RideStatus,
    ) -> Result<Option<Ride>, RideRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RideRepositoryError::connection))?;

        let row = diesel::update(
            rides::table
                .filter(rides::id.eq(id.as_uuid()))
                .filter(rides::status.eq(expected.as_str())),
        )
        .set((
            rides::status.eq(target.as_str()),
            rides::updated_at.eq(Utc::now()),
        ))
        .returning(RideRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_db_error)?;

        row.map(decode).transpose()
    }
}

//! PostgreSQL-backed `DriverRepository` implementation using Diesel ORM.
//!
//! Read-only: driver onboarding happens elsewhere, ride creation only needs
//! to resolve a driver and check the licence flag.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{DriverRepository, DriverRepositoryError};
use crate::domain::{Driver, DriverId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::DriverRow;
use super::pool::DbPool;
use super::schema::drivers;

/// Diesel-backed implementation of the `DriverRepository` port.
#[derive(Clone)]
pub struct DieselDriverRepository {
    pool: DbPool,
}

impl DieselDriverRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_db_error(error: diesel::result::Error) -> DriverRepositoryError {
    map_diesel_error(
        error,
        DriverRepositoryError::query,
        DriverRepositoryError::connection,
    )
}

#[async_trait]
impl DriverRepository for DieselDriverRepository {
    async fn find_by_id(&self, id: &DriverId) -> Result<Option<Driver>, DriverRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, DriverRepositoryError::connection))?;

        let row = drivers::table
            .filter(drivers::id.eq(id.as_uuid()))
            .select(DriverRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_db_error)?;

        Ok(row.map(DriverRow::into_domain))
    }
}

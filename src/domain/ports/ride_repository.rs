//! Port for ride persistence.

use async_trait::async_trait;

use crate::domain::ids::RideId;
use crate::domain::ride::{Ride, RidePatch, RideStatus};

/// Errors raised by ride store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RideRepositoryError {
    /// Store connection could not be established.
    #[error("ride store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("ride store query failed: {message}")]
    Query { message: String },
}

impl RideRepositoryError {
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

/// Port for reading and writing rides.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RideRepository: Send + Sync {
    /// Find a ride by id.
    async fn find_by_id(&self, id: &RideId) -> Result<Option<Ride>, RideRepositoryError>;

    /// List every ride.
    async fn list_all(&self) -> Result<Vec<Ride>, RideRepositoryError>;

    /// Persist a new ride.
    async fn insert(&self, ride: &Ride) -> Result<(), RideRepositoryError>;

    /// Apply the patch to an existing ride; `None` when the ride is absent.
    async fn update(
        &self,
        id: &RideId,
        patch: &RidePatch,
    ) -> Result<Option<Ride>, RideRepositoryError>;

    /// Delete a ride; `false` when nothing was removed.
    async fn delete(&self, id: &RideId) -> Result<bool, RideRepositoryError>;

    /// The single conditional status write: set the status to `target` only
    /// where the stored status still equals `expected`. `None` means the
    /// write matched zero rows — the ride changed under the caller (or was
    /// deleted) and the caller lost the race.
    async fn transition_status(
        &self,
        id: &RideId,
        expected: RideStatus,
        target: RideStatus,
    ) -> Result<Option<Ride>, RideRepositoryError>;
}

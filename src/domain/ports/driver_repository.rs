//! Port for the driver store's read contract.
//!
//! Driver CRUD is an external collaborator; the engine only resolves the
//! driver a ride is being created against.

use async_trait::async_trait;

use crate::domain::driver::Driver;
use crate::domain::ids::DriverId;

/// Errors raised by driver store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverRepositoryError {
    /// Store connection could not be established.
    #[error("driver store connection failed: {message}")]
    Connection { message: String },
    /// Query failed during execution.
    #[error("driver store query failed: {message}")]
    Query { message: String },
}

impl DriverRepositoryError {
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

/// Port for resolving drivers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DriverRepository: Send + Sync {
    /// Find a driver by id.
    async fn find_by_id(&self, id: &DriverId) -> Result<Option<Driver>, DriverRepositoryError>;
}

//! Port for the user store's minimal read/write contract.

use async_trait::async_trait;

use crate::domain::ids::UserId;
use crate::domain::user::{User, UserPatch};

/// Errors raised by user store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserRepositoryError {
    /// Store connection could not be established.
    #[error("user store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user store query failed: {message}")]
    Query { message: String },
}

impl UserRepositoryError {
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

/// Port for reading and updating users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// List every user.
    async fn list_all(&self) -> Result<Vec<User>, UserRepositoryError>;

    /// Apply the patch to an existing user; `None` when absent.
    async fn update(
        &self,
        id: &UserId,
        patch: &UserPatch,
    ) -> Result<Option<User>, UserRepositoryError>;
}

//! Cached reads and profile updates for users.

use std::sync::Arc;

use super::cache_coordinator::CacheCoordinator;
use super::caller::Caller;
use super::error::DomainError;
use super::ids::UserId;
use super::ports::{CacheKey, UserRepository, UserRepositoryError};
use super::user::{User, UserPatch};

fn map_user_repo_error(error: UserRepositoryError) -> DomainError {
    match error {
        UserRepositoryError::Connection { message } => {
            DomainError::internal(format!("user store unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            DomainError::internal(format!("user store error: {message}"))
        }
    }
}

/// Read-mostly access to user profiles.
#[derive(Clone)]
pub struct UserDirectory {
    users: Arc<dyn UserRepository>,
    cache: CacheCoordinator,
}

impl UserDirectory {
    pub fn new(users: Arc<dyn UserRepository>, cache: CacheCoordinator) -> Self {
        Self { users, cache }
    }

    /// Read a user through the cache.
    pub async fn get_user(&self, id: &UserId) -> Result<User, DomainError> {
        self.cache
            .get_or_populate(CacheKey::user(id), || async {
                self.users
                    .find_by_id(id)
                    .await
                    .map_err(map_user_repo_error)?
                    .ok_or_else(|| DomainError::not_found(format!("user {id} not found")))
            })
            .await
    }

    /// List every user through the cache. Admin only.
    pub async fn list_users(&self, caller: &Caller) -> Result<Vec<User>, DomainError> {
        if !caller.is_admin {
            return Err(DomainError::forbidden("only an admin can list users"));
        }
        self.cache
            .get_or_populate(CacheKey::users_all(), || async {
                self.users.list_all().await.map_err(map_user_repo_error)
            })
            .await
    }

    /// Patch a user's profile fields.
    pub async fn update_user(&self, id: &UserId, patch: &UserPatch) -> Result<User, DomainError> {
        if patch.is_empty() {
            return Err(DomainError::invalid_argument("update contains no fields"));
        }
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(
                    DomainError::invalid_argument("name must not be blank").with_field("name")
                );
            }
        }
        if let Some(email) = &patch.email {
            if !email.contains('@') {
                return Err(DomainError::invalid_argument(format!(
                    "email {email} is not a valid address"
                ))
                .with_field("email"));
            }
        }

        let updated = self
            .users
            .update(id, patch)
            .await
            .map_err(map_user_repo_error)?
            .ok_or_else(|| DomainError::not_found(format!("user {id} not found")))?;

        self.cache.invalidate_user(id).await;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;

    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{MockUserRepository, NoopCache};

    fn user_fixture(id: UserId) -> User {
        let now = Utc::now();
        User {
            id,
            name: "Asha".to_owned(),
            email: "asha@example.com".to_owned(),
            is_admin: false,
            is_driver: false,
            is_rider: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn service(users: MockUserRepository) -> UserDirectory {
        UserDirectory::new(Arc::new(users), CacheCoordinator::new(Arc::new(NoopCache)))
    }

    #[rstest]
    #[tokio::test]
    async fn absent_users_map_to_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));
        let err = service(users)
            .get_user(&UserId::random())
            .await
            .expect_err("absent user");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_patches_are_rejected_before_the_store() {
        let mut users = MockUserRepository::new();
        users.expect_update().never();
        let err = service(users)
            .update_user(&UserId::random(), &UserPatch::default())
            .await
            .expect_err("empty patch refused");
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[rstest]
    #[case(UserPatch { name: Some("  ".to_owned()), email: None }, "name")]
    #[case(UserPatch { name: None, email: Some("not-an-address".to_owned()) }, "email")]
    #[tokio::test]
    async fn malformed_fields_are_named_in_the_details(
        #[case] patch: UserPatch,
        #[case] field: &str,
    ) {
        let mut users = MockUserRepository::new();
        users.expect_update().never();
        let err = service(users)
            .update_user(&UserId::random(), &patch)
            .await
            .expect_err("malformed patch refused");
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert_eq!(
            err.details().and_then(|d| d.get("field")).and_then(|f| f.as_str()),
            Some(field)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn updates_return_the_stored_row() {
        let id = UserId::random();
        let mut renamed = user_fixture(id);
        renamed.name = "Asha K".to_owned();

        let mut users = MockUserRepository::new();
        let stored = renamed.clone();
        users
            .expect_update()
            .withf(move |uid, patch| *uid == id && patch.name.as_deref() == Some("Asha K"))
            .times(1)
            .returning(move |_, _| Ok(Some(stored.clone())));

        let patch = UserPatch {
            name: Some("Asha K".to_owned()),
            email: None,
        };
        let updated = service(users)
            .update_user(&id, &patch)
            .await
            .expect("update applies");
        assert_eq!(updated.name, "Asha K");
    }

    #[rstest]
    #[tokio::test]
    async fn listing_requires_the_admin_role() {
        let err = service(MockUserRepository::new())
            .list_users(&Caller::rider(UserId::random()))
            .await
            .expect_err("non-admin refused");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}

//! User profile directory.

use std::sync::Arc;

use starledger_shared::AppError;
use starledger_shared::types::UserId;
use thiserror::Error;
use tracing::info;

use crate::auth::Principal;
use crate::records::{Claim, NewUser, UserAccount};
use crate::store::{LedgerStore, StoreError, UserStore};

/// Errors from the user directory.
#[derive(Debug, Error)]
pub enum UserError {
    /// User does not exist.
    #[error("User with ID {0} was not found")]
    NotFound(UserId),

    /// Storage failure, including duplicate id or email.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl UserError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Store(StoreError::Conflict(_)) => 409,
            Self::Store(StoreError::Rejected { .. }) => 400,
            Self::Store(StoreError::Backend(_)) => 500,
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => Self::NotFound(err.to_string()),
            UserError::Store(store) => store.into(),
        }
    }
}

/// Lists, registers, edits and deletes user profiles.
pub struct UserDirectory<S> {
    store: Arc<S>,
}

impl<S: UserStore + LedgerStore> UserDirectory<S> {
    /// Creates a directory over `store`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Every user, ordered by email.
    pub async fn list(&self) -> Result<Vec<UserAccount>, UserError> {
        Ok(self.store.list_users().await?)
    }

    /// One user.
    pub async fn get(&self, user_id: UserId) -> Result<UserAccount, UserError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))
    }

    /// Registers a user with a zero balance.
    pub async fn register(&self, user: NewUser) -> Result<UserAccount, UserError> {
        let account = self.store.create_user(user).await?;
        info!(user_id = %account.id, "User registered");
        Ok(account)
    }

    /// Changes the given profile fields.
    pub async fn update(
        &self,
        user_id: UserId,
        email: Option<String>,
        handle: Option<String>,
    ) -> Result<UserAccount, UserError> {
        let account = self
            .store
            .update_profile(user_id, email, handle)
            .await?
            .ok_or(UserError::NotFound(user_id))?;
        info!(user_id = %user_id, "User profile updated");
        Ok(account)
    }

    /// Deletes a user with their holdings, history and grants.
    pub async fn delete(&self, user_id: UserId) -> Result<(), UserError> {
        if !self.store.delete_user(user_id).await? {
            return Err(UserError::NotFound(user_id));
        }
        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    /// Claims carried by the caller.
    #[must_use]
    pub fn claims(&self, principal: &Principal) -> Vec<Claim> {
        principal.claims.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            id: UserId::new(),
            email: email.to_string(),
            handle: Some("Pilot".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_get() {
        let directory = UserDirectory::new(Arc::new(MemoryStore::new()));
        let user = directory.register(new_user("a@example.com")).await.unwrap();

        let loaded = directory.get(user.id).await.unwrap();

        assert_eq!(loaded.balance, 0);
        assert_eq!(loaded.display_name(), "Pilot");
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let directory = UserDirectory::new(Arc::new(MemoryStore::new()));
        let user = new_user("a@example.com");
        directory.register(user.clone()).await.unwrap();

        let err = directory.register(user).await.unwrap_err();

        assert_eq!(err.http_status_code(), 409);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_user() {
        let directory = UserDirectory::new(Arc::new(MemoryStore::new()));

        assert!(matches!(
            directory.update(UserId::new(), None, None).await,
            Err(UserError::NotFound(_))
        ));
        assert!(matches!(
            directory.delete(UserId::new()).await,
            Err(UserError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_changes_only_given_fields() {
        let directory = UserDirectory::new(Arc::new(MemoryStore::new()));
        let user = directory.register(new_user("a@example.com")).await.unwrap();

        let updated = directory
            .update(user.id, Some("b@example.com".to_string()), None)
            .await
            .unwrap();

        assert_eq!(updated.email, "b@example.com");
        assert_eq!(updated.handle.as_deref(), Some("Pilot"));
    }
}

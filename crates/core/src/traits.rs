// Trait definitions for pluggable persistence
//
// The authentication layer only ever talks to storage through CredentialStore.

use async_trait::async_trait;
use uuid::Uuid;

use crate::account::{Account, NewAccount};
use crate::error::StoreError;

/// Credential store consumed by the authentication layer
///
/// Implementations must make `create` atomic: of two concurrent creates for the
/// same email, exactly one succeeds and the other returns `StoreError::Duplicate`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an account by exact email
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Persist a new account
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;

    /// Remove an account; used by compensating actions of profile flows.
    /// Returns false when no such account exists.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

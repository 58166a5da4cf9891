// Authentication service: registration, login and account provisioning
// Decision: Both login failure paths return the same error value, so the wire
// response is byte-identical (constant shape, not constant time)
// Decision: Argon2 work runs on the blocking pool

use registrar_core::{Account, CredentialStore, NewAccount, PublicProfile, Role, StoreError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::validation::{validate_email, validate_name, validate_password, ValidationError};
use crate::auth::config::AdminConfig;
use crate::auth::jwt::{TokenError, TokenService};
use crate::error::ApiError;
use crate::storage::{PasswordError, PasswordHasher};

const ACCOUNT_EXISTS: &str = "account with this email already exists";
const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Authentication failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("{}", ACCOUNT_EXISTS)]
    Conflict,
    #[error("{}", INVALID_CREDENTIALS)]
    InvalidCredentials,
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("password task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        if err.is_duplicate() {
            AuthError::Conflict
        } else {
            AuthError::Store(err)
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Invalid(e) => ApiError::BadRequest(e.0),
            AuthError::Conflict => ApiError::conflict(ACCOUNT_EXISTS),
            AuthError::InvalidCredentials => ApiError::unauthorized(INVALID_CREDENTIALS),
            AuthError::Store(e) => e.into(),
            AuthError::Password(e) => e.into(),
            AuthError::Token(e) => e.into(),
            AuthError::Task(e) => ApiError::Internal(e.into()),
        }
    }
}

/// Everything needed to create an account; the password is still plaintext
#[derive(Clone)]
pub struct AccountInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl AccountInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        validate_name("firstName", &self.first_name)?;
        validate_name("lastName", &self.last_name)?;
        Ok(())
    }
}

/// Successful register/login payload
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Signed bearer token
    pub token: String,
    pub user: PublicProfile,
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Register a new account and sign a token for it
    pub async fn register(&self, input: AccountInput) -> Result<AuthResponse, AuthError> {
        let account = self.create_account(input).await?;
        self.respond(&account)
    }

    /// Exchange email and password for a token
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let Some(account) = self.store.find_by_email(email).await? else {
            tracing::debug!("Login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let hash = account.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await?;

        if !valid {
            tracing::debug!(account_id = %account.id, "Login failed: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(account_id = %account.id, role = %account.role, "Login succeeded");
        self.respond(&account)
    }

    /// Validate, hash and persist a new account
    ///
    /// Shared by registration and the student/teacher profile flows.
    pub async fn create_account(&self, input: AccountInput) -> Result<Account, AuthError> {
        input.validate()?;

        if self.store.find_by_email(&input.email).await?.is_some() {
            return Err(AuthError::Conflict);
        }

        let hasher = self.hasher.clone();
        let password = input.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        // A concurrent create for the same email surfaces here as Duplicate -> Conflict
        let account = self
            .store
            .create(NewAccount {
                email: input.email,
                password_hash,
                first_name: input.first_name,
                last_name: input.last_name,
                role: input.role,
            })
            .await?;

        tracing::info!(account_id = %account.id, role = %account.role, "Account created");
        Ok(account)
    }

    /// Delete an account; compensating action for failed profile flows
    pub async fn remove_account(&self, id: Uuid) -> Result<bool, AuthError> {
        let removed = self.store.delete(id).await?;
        tracing::info!(account_id = %id, removed, "Account removed");
        Ok(removed)
    }

    /// Create the configured administrator account unless the email is taken
    ///
    /// Returns true when an account was created.
    pub async fn ensure_admin(&self, admin: &AdminConfig) -> Result<bool, AuthError> {
        if self.store.find_by_email(&admin.email).await?.is_some() {
            tracing::debug!("Bootstrap admin already exists");
            return Ok(false);
        }

        let created = self
            .create_account(AccountInput {
                email: admin.email.clone(),
                password: admin.password.clone(),
                first_name: "System".to_string(),
                last_name: "Administrator".to_string(),
                role: Role::Administrator,
            })
            .await;

        match created {
            Ok(_) => Ok(true),
            // Another instance won the race
            Err(AuthError::Conflict) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn respond(&self, account: &Account) -> Result<AuthResponse, AuthError> {
        let token = self.tokens.issue(account)?;
        Ok(AuthResponse {
            token,
            user: account.public_profile(),
        })
    }
}

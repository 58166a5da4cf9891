// Registrar Core
//
// DB-agnostic identity types shared by the control plane and its storage backends.
//
// Key design decisions:
// - Role is a closed enum everywhere (token claims, allow-lists, request bodies)
// - Accounts carry the password hash but never serialize it
// - CredentialStore is the only seam between authentication and persistence

pub mod account;
pub mod error;
pub mod role;
pub mod telemetry;
pub mod traits;

// Re-exports for convenience
pub use account::{Account, NewAccount, PublicProfile};
pub use error::StoreError;
pub use role::{ParseRoleError, Role};
pub use traits::CredentialStore;

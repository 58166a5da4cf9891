// Storage layer for the Registrar control-plane
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)
//
// - StorageBackend: enum dispatch over the two backends; implements CredentialStore
// - PasswordHasher: Argon2id hashing used before anything reaches a backend

pub mod backend;
pub mod memory;
pub mod models;
pub mod password;
pub mod repositories;

pub use backend::StorageBackend;
pub use memory::InMemoryDatabase;
pub use models::*;
pub use password::{HashingCost, PasswordError, PasswordHasher};
pub use repositories::Database;

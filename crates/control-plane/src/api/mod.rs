// HTTP API routes
//
// Route handlers for the academic records API. Auth routes live in `crate::auth`.

pub mod access;
pub mod common;
pub mod records;
pub mod validation;

// Re-export common types
pub use common::{ErrorResponse, ListResponse};

// Services layer for business logic
// Services own business logic and validation, calling storage directly

pub mod auth;
pub mod records;

pub use auth::{AccountInput, AuthError, AuthResponse, AuthService};
pub use records::RecordService;

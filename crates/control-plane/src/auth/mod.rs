// Identity and access control
// Decision: Authentication (token -> identity) and authorization (identity -> allowed?)
// are separate route layers; authorization never runs without an identity

pub mod config;
pub mod jwt;
pub mod middleware;
pub mod routes;

pub use config::{AdminConfig, AuthConfig, ConfigError, JwtConfig};
pub use jwt::{Claims, TokenError, TokenService};
pub use middleware::{authenticate, authorize, restrict, AllowedRoles, AuthUser};
pub use routes::{routes, AuthState};

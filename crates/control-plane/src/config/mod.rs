// Server configuration loading
//
// Network-facing settings read at startup. Authentication settings live in
// `crate::auth::config`.

use axum::http::HeaderValue;
use std::net::SocketAddr;

use crate::auth::ConfigError;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Prefix applied to every API route, e.g. "/v1" (default: empty)
    pub api_prefix: String,
    /// Allowed CORS origins; empty means same-origin only
    pub cors_origins: Vec<HeaderValue>,
    /// PostgreSQL connection string; in-memory storage when absent
    pub database_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// - `BIND_ADDR` (default: "0.0.0.0:9000")
    /// - `API_PREFIX`
    /// - `CORS_ALLOWED_ORIGINS`: comma-separated list
    /// - `DATABASE_URL`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.trim().parse().map_err(|_| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: raw_addr.clone(),
        })?;

        let api_prefix = get("API_PREFIX")
            .map(|p| p.trim().trim_end_matches('/').to_string())
            .unwrap_or_default();

        let cors_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
            .unwrap_or_default();

        Ok(Self {
            bind_addr,
            api_prefix,
            cors_origins,
            database_url: get("DATABASE_URL"),
        })
    }
}

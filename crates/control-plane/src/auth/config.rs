// Authentication configuration loaded from environment variables.
// Decision: AUTH_ prefix for all auth config
// Decision: Without a database (dev mode) a missing signing secret is generated at
// random; with a database it is a startup error, since tokens must survive restarts

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::storage::HashingCost;

/// Issuer stamped into every token and required on verification
pub const DEFAULT_ISSUER: &str = "university-management-system";

/// Session token lifetime when AUTH_JWT_TOKEN_LIFETIME is unset
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("AUTH_JWT_SECRET must be set when DATABASE_URL is configured")]
    MissingSecret,
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Admin account created at startup when absent
#[derive(Clone)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWTs
    pub secret: String,
    /// Value of the `iss` claim
    pub issuer: String,
    /// Time between `iat` and `exp`
    pub token_lifetime: Duration,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: DEFAULT_ISSUER.to_string(),
            token_lifetime: DEFAULT_TOKEN_LIFETIME,
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("token_lifetime", &self.token_lifetime)
            .finish()
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Admin account bootstrapped at startup
    pub admin: Option<AdminConfig>,
    /// Whether to disable public registration
    pub disable_signup: bool,
    /// Whether public registration may request the ADMIN role
    pub disable_admin_signup: bool,
    /// Argon2 work factor for new hashes
    pub hashing: HashingCost,
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env(dev_mode: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(dev_mode, |key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(dev_mode: bool, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = match get("AUTH_JWT_SECRET") {
            Some(secret) => secret,
            None if dev_mode => {
                tracing::warn!(
                    "AUTH_JWT_SECRET not set, using a random secret; tokens will not survive a restart"
                );
                use rand::Rng;
                let bytes: [u8; 32] = rand::thread_rng().gen();
                hex::encode(bytes)
            }
            None => return Err(ConfigError::MissingSecret),
        };

        let issuer = get("AUTH_JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string());

        let token_lifetime = match get("AUTH_JWT_TOKEN_LIFETIME") {
            Some(raw) => Duration::from_secs(parse_positive("AUTH_JWT_TOKEN_LIFETIME", &raw)?),
            None => DEFAULT_TOKEN_LIFETIME,
        };

        let admin = match (get("AUTH_ADMIN_EMAIL"), get("AUTH_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminConfig { email, password }),
            _ => None,
        };

        let flag = |key: &str| {
            get(key)
                .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
                .unwrap_or(false)
        };

        let defaults = HashingCost::default();
        let cost = |key: &'static str, default: u32| -> Result<u32, ConfigError> {
            match get(key) {
                Some(raw) => parse_positive(key, &raw).and_then(|v| {
                    u32::try_from(v).map_err(|_| ConfigError::Invalid { key, value: raw })
                }),
                None => Ok(default),
            }
        };
        let hashing = HashingCost {
            memory_kib: cost("AUTH_ARGON2_MEMORY_KIB", defaults.memory_kib)?,
            iterations: cost("AUTH_ARGON2_ITERATIONS", defaults.iterations)?,
            parallelism: cost("AUTH_ARGON2_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            jwt: JwtConfig {
                secret,
                issuer,
                token_lifetime,
            },
            admin,
            disable_signup: flag("AUTH_DISABLE_SIGNUP"),
            disable_admin_signup: flag("AUTH_DISABLE_ADMIN_SIGNUP"),
            hashing,
        })
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}

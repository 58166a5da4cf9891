// Registrar API server
// Decision: DATABASE_URL selects PostgreSQL; without it the server runs on in-memory
// storage in dev mode, where a missing JWT secret is tolerated

use anyhow::{Context, Result};
use registrar_control_plane::app::build_app;
use registrar_control_plane::auth::{AuthConfig, AuthState, TokenService};
use registrar_control_plane::config::ServerConfig;
use registrar_control_plane::storage::{PasswordHasher, StorageBackend};
use registrar_control_plane::{AuthService, RecordService};
use registrar_core::telemetry::{init_telemetry, TelemetryConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Configure via environment variables:
    // - RUST_LOG / LOG_LEVEL: Log filter (default: "registrar_control_plane=debug,tower_http=debug")
    // - LOG_FORMAT=json: JSON log lines
    let mut telemetry_config = TelemetryConfig::from_env();
    if telemetry_config.service_name == "registrar" {
        telemetry_config.service_name = "registrar-control-plane".to_string();
    }
    if telemetry_config.log_filter.is_none() {
        telemetry_config.log_filter =
            Some("registrar_control_plane=debug,tower_http=debug".to_string());
    }
    telemetry_config.service_version = Some(env!("CARGO_PKG_VERSION").to_string());
    init_telemetry(&telemetry_config).context("Failed to initialize telemetry")?;

    tracing::info!("registrar-control-plane starting...");

    let server_config = ServerConfig::from_env().context("Invalid server configuration")?;

    // Initialize storage
    let (backend, storage) = match &server_config.database_url {
        Some(url) => {
            let backend = StorageBackend::postgres(url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");
            (backend, "postgres")
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (data is lost on exit)");
            (StorageBackend::in_memory(), "memory")
        }
    };
    let db = Arc::new(backend);

    // Load authentication configuration
    let auth_config = AuthConfig::from_env(db.is_dev_mode())
        .context("Invalid authentication configuration")?;
    tracing::info!(
        issuer = %auth_config.jwt.issuer,
        token_lifetime_secs = auth_config.jwt.token_lifetime.as_secs(),
        signup_disabled = auth_config.disable_signup,
        admin_signup_disabled = auth_config.disable_admin_signup,
        "Authentication configured"
    );

    let hasher = PasswordHasher::new(auth_config.hashing).context("Invalid Argon2 parameters")?;
    let tokens = Arc::new(TokenService::new(auth_config.jwt.clone()));
    let accounts = Arc::new(AuthService::new(db.clone(), hasher, tokens.clone()));

    if let Some(admin) = &auth_config.admin {
        accounts
            .ensure_admin(admin)
            .await
            .context("Failed to provision administrator account")?;
    }

    let records = Arc::new(RecordService::new(db.clone(), accounts.clone()));
    let auth_state = AuthState {
        config: Arc::new(auth_config),
        tokens,
        service: accounts,
    };

    let app = build_app(auth_state, records, &server_config, storage);

    // Start HTTP server
    let listener = tokio::net::TcpListener::bind(server_config.bind_addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", server_config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

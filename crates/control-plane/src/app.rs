// HTTP application assembly
// Decision: /health and the OpenAPI document are never prefixed or authenticated
// Decision: CORS is only installed when origins are configured

use axum::http::{header, Method};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api;
use crate::auth::{self, AuthState};
use crate::config::ServerConfig;
use crate::openapi::ApiDoc;
use crate::services::RecordService;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    storage: &'static str,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    storage: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage,
    })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the complete HTTP application
pub fn build_app(
    auth_state: AuthState,
    records: Arc<RecordService>,
    server: &ServerConfig,
    storage: &'static str,
) -> Router {
    let tokens = auth_state.tokens.clone();
    let api_routes = Router::new()
        .merge(auth::routes(auth_state))
        .merge(api::records::routes(records, tokens));

    if !server.api_prefix.is_empty() {
        tracing::info!(prefix = %server.api_prefix, "API prefix configured");
    }

    let app = Router::new()
        .route("/health", get(health).with_state(HealthState { storage }))
        .route("/api-doc/openapi.json", get(openapi_json))
        .merge(build_router_with_prefix(api_routes, &server.api_prefix));

    // Add CORS layer only if origins are configured
    let app = if !server.cors_origins.is_empty() {
        tracing::info!(origins = ?server.cors_origins, "CORS origins configured");
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(server.cors_origins.clone()))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                ])
                .allow_credentials(true),
        )
    } else {
        tracing::info!("CORS not configured (same-origin requests only)");
        app
    };

    app.layer(TraceLayer::new_for_http())
}

/// Build router with optional API prefix (extracted for testing)
pub fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}

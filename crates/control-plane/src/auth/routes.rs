// Authentication HTTP routes
// Decision: /auth/register and /auth/login are public; /auth/me sits behind the
// authentication stage only

use axum::{extract::State, http::StatusCode, middleware, routing::get, routing::post, Json, Router};
use registrar_core::Role;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    config::AuthConfig,
    jwt::TokenService,
    middleware::{authenticate, AuthUser},
};
use crate::error::{ApiError, ApiJson};
use crate::services::auth::{AccountInput, AuthResponse, AuthService};

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AuthConfig>,
    pub tokens: Arc<TokenService>,
    pub service: Arc<AuthService>,
}

/// Register request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "a@x.com")]
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authorization context of the caller
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            authenticate,
        ));

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .merge(protected)
        .with_state(state)
}

/// POST /auth/register - Create an account and return a session token
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input", body = crate::api::ErrorResponse),
        (status = 403, description = "Registration disabled", body = crate::api::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::api::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AuthState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    if state.config.disable_signup {
        return Err(ApiError::forbidden("registration is disabled"));
    }
    if state.config.disable_admin_signup && req.role == Role::Administrator {
        return Err(ApiError::forbidden("administrator registration is disabled"));
    }

    let response = state
        .service
        .register(AccountInput {
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            role: req.role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /auth/login - Exchange credentials for a session token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = crate::api::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AuthState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = state.service.login(&req.email, &req.password).await?;
    Ok(Json(response))
}

/// GET /auth/me - Return the caller's identity and role
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current identity", body = MeResponse),
        (status = 401, description = "Missing or invalid token", body = crate::api::ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: user.id,
        email: user.email,
        role: user.role,
    })
}

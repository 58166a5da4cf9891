// Authentication and authorization middleware
// Decision: Two independent stages. `authenticate` verifies the bearer token and
// binds an AuthUser into request extensions (failure is always 401); `authorize`
// checks the route's static role allow-set (failure is always 403)
// Decision: Role membership is exact; there is no role hierarchy

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use registrar_core::Role;
use std::sync::Arc;
use uuid::Uuid;

use super::jwt::{Claims, TokenService};
use crate::error::ApiError;

pub const MISSING_HEADER: &str = "authorization header is required";
pub const MALFORMED_HEADER: &str = "authorization header format must be Bearer {token}";
pub const INSUFFICIENT_PERMISSIONS: &str = "insufficient permissions";

/// Authorization context bound to a request after token verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Account ID
    pub id: Uuid,
    /// Account email
    pub email: String,
    /// Account role
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Extractor for the authenticated user
/// Returns 401 when the route is not behind `authenticate`
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized(MISSING_HEADER))
    }
}

/// Split an Authorization header value into its token
///
/// Exactly two space-separated parts are required and the first must be `Bearer`.
pub fn parse_bearer(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Some(token),
        _ => None,
    }
}

/// Authentication stage: verify the bearer token and bind the AuthUser
pub async fn authenticate(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized(MISSING_HEADER))?;

    let token = header_value
        .to_str()
        .ok()
        .and_then(parse_bearer)
        .ok_or_else(|| ApiError::unauthorized(MALFORMED_HEADER))?;

    let claims = tokens.verify(token).map_err(|e| {
        tracing::debug!(path = %request.uri().path(), "Token rejected: {}", e);
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Static set of roles permitted on a route
#[derive(Debug, Clone, Copy)]
pub struct AllowedRoles(pub &'static [Role]);

impl AllowedRoles {
    pub fn permits(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

/// Authorization stage: require the bound role to be in the allow-set
pub async fn authorize(
    State(allowed): State<AllowedRoles>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(user) = request.extensions().get::<AuthUser>() else {
        return Err(ApiError::unauthorized(MISSING_HEADER));
    };

    if !allowed.permits(user.role) {
        tracing::warn!(
            account_id = %user.id,
            role = %user.role,
            method = %request.method(),
            path = %request.uri().path(),
            "Role denied"
        );
        return Err(ApiError::forbidden(INSUFFICIENT_PERMISSIONS));
    }

    Ok(next.run(request).await)
}

/// Attach a role allow-set to a method router
///
/// The route must also sit behind `authenticate`.
pub fn restrict<S>(route: MethodRouter<S>, roles: &'static [Role]) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(middleware::from_fn_with_state(AllowedRoles(roles), authorize))
}

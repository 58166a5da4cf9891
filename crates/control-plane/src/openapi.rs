// OpenAPI specification generation
//
// Shared by the API server (served at /api-doc/openapi.json) and the
// export-openapi binary.

use registrar_core::{PublicProfile, Role};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::ErrorResponse;
use crate::auth::routes::{LoginRequest, MeResponse, RegisterRequest};
use crate::services::AuthResponse;

/// OpenAPI documentation for the Registrar API
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::auth::routes::register,
        crate::auth::routes::login,
        crate::auth::routes::me,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, MeResponse,
            AuthResponse, PublicProfile, Role,
            ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login and identity endpoints")
    ),
    info(
        title = "Registrar API",
        version = "0.1.0",
        description = "Role-based API for students, teachers, courses and enrollments",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

impl ApiDoc {
    /// Generate the OpenAPI spec as a pretty-printed JSON string
    pub fn to_json() -> Result<String, serde_json::Error> {
        Self::openapi().to_pretty_json()
    }
}

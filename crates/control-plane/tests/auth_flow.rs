// End-to-end access control tests against the assembled router
//
// Runs on in-memory storage; no database or network needed.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use registrar_control_plane::app::build_app;
use registrar_control_plane::auth::{AuthConfig, AuthState, JwtConfig, TokenService};
use registrar_control_plane::config::ServerConfig;
use registrar_control_plane::storage::{HashingCost, PasswordHasher, StorageBackend};
use registrar_control_plane::{AuthService, RecordService};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "Str0ng!Pass";

fn build(config: AuthConfig) -> Router {
    let db = Arc::new(StorageBackend::in_memory());
    let hasher = PasswordHasher::new(HashingCost {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap();
    let tokens = Arc::new(TokenService::new(config.jwt.clone()));
    let accounts = Arc::new(AuthService::new(db.clone(), hasher, tokens.clone()));
    let records = Arc::new(RecordService::new(db, accounts.clone()));
    let server = ServerConfig::from_lookup(|_| None).unwrap();

    build_app(
        AuthState {
            config: Arc::new(config),
            tokens,
            service: accounts,
        },
        records,
        &server,
        "memory",
    )
}

fn app() -> Router {
    build(AuthConfig {
        jwt: JwtConfig::new("integration-test-secret"),
        ..Default::default()
    })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, email: &str, role: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": ADMIN_PASSWORD,
            "firstName": "Ada",
            "lastName": "Lovelace",
            "role": role
        })),
    )
    .await
}

async fn token_for(app: &Router, email: &str, role: &str) -> String {
    let (status, body) = register(app, email, role).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_returns_token_and_profile() {
    let app = app();
    let (status, body) = register(&app, "a@x.com", "ADMIN").await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["role"], "ADMIN");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn test_admin_token_reaches_admin_route() {
    let app = app();
    let token = token_for(&app, "a@x.com", "ADMIN").await;

    let (status, body) = send(&app, "GET", "/api/students", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": [] }));

    let (status, body) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "a@x.com");
    assert_eq!(body["role"], "ADMIN");
}

#[tokio::test]
async fn test_missing_and_tampered_tokens() {
    let app = app();
    let token = token_for(&app, "a@x.com", "ADMIN").await;

    let (status, body) = send(&app, "GET", "/api/students", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authorization header is required");

    // Flip one character of the signature
    let (head, signature) = token.rsplit_once('.').unwrap();
    let mut chars: Vec<char> = signature.chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    let tampered = format!("{}.{}", head, chars.into_iter().collect::<String>());

    let (status, body) = send(&app, "GET", "/api/students", Some(&tampered), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid or expired token");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = app();
    token_for(&app, "a@x.com", "ADMIN").await;

    let (status, body) = register(&app, "a@x.com", "STUDENT").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "account with this email already exists");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = app();
    token_for(&app, "a@x.com", "ADMIN").await;

    let (unknown_status, unknown_body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@x.com", "password": ADMIN_PASSWORD })),
    )
    .await;
    let (wrong_status, wrong_body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "Wr0ng!Pass" })),
    )
    .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, wrong_status);
    assert_eq!(unknown_body, wrong_body);

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": ADMIN_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_student_is_forbidden_on_admin_routes() {
    let app = app();
    let token = token_for(&app, "s@x.com", "STUDENT").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/courses",
        Some(&token),
        Some(json!({ "code": "CS101" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "insufficient permissions");
}

#[tokio::test]
async fn test_weak_password_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "weak@x.com",
            "password": "password",
            "firstName": "Weak",
            "lastName": "Password",
            "role": "STUDENT"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("password must"));
}

#[tokio::test]
async fn test_student_record_owns_login_account() {
    let app = app();
    let admin = token_for(&app, "a@x.com", "ADMIN").await;

    let (status, created) = send(
        &app,
        "POST",
        "/api/students",
        Some(&admin),
        Some(json!({
            "studentId": "S-100",
            "email": "stu@x.com",
            "password": "Stud3nt!Pass",
            "firstName": "Alan",
            "lastName": "Turing"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    // The linked account can log in as a student
    let login = json!({ "email": "stu@x.com", "password": "Stud3nt!Pass" });
    let (status, body) = send(&app, "POST", "/auth/login", None, Some(login.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "STUDENT");

    // Same student id again: record write fails and the new account is rolled back
    let (status, _) = send(
        &app,
        "POST",
        "/api/students",
        Some(&admin),
        Some(json!({
            "studentId": "S-100",
            "email": "other@x.com",
            "password": "Stud3nt!Pass",
            "firstName": "Other",
            "lastName": "Student"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "other@x.com", "password": "Stud3nt!Pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Deleting the record removes the account
    let (status, _) = send(&app, "DELETE", &format!("/api/students/{}", id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "POST", "/auth/login", None, Some(login)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_switches() {
    let app = build(AuthConfig {
        jwt: JwtConfig::new("integration-test-secret"),
        disable_admin_signup: true,
        ..Default::default()
    });
    let (status, body) = register(&app, "a@x.com", "ADMIN").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "administrator registration is disabled");
    let (status, _) = register(&app, "t@x.com", "TEACHER").await;
    assert_eq!(status, StatusCode::CREATED);

    let app = build(AuthConfig {
        jwt: JwtConfig::new("integration-test-secret"),
        disable_signup: true,
        ..Default::default()
    });
    let (status, body) = register(&app, "s@x.com", "STUDENT").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "registration is disabled");
}

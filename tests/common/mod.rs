#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use devconnect::{ServerConfig, create_app, db::Database, jwt::JwtConfig};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const JWT_SECRET: &[u8] = b"integration-test-jwt-secret-0123456789";

pub fn test_config(db: Database) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: JWT_SECRET.to_vec(),
        token_ttl_secs: 3600,
        bcrypt_cost: 4,
        auth_rate_limit_per_minute: 0,
        trust_forwarded_for: false,
    }
}

pub async fn create_test_app() -> (Router, Database) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let app = create_app(&test_config(db.clone())).expect("Failed to create app");
    (app, db)
}

pub fn create_jwt() -> JwtConfig {
    JwtConfig::new(JWT_SECRET, 3600).unwrap()
}

/// Send a request and return the status with the parsed JSON body (Null if empty).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("x-auth-token", token);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    read_response(app, request).await
}

/// Send a body as-is, with an optional content type.
pub async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    read_response(app, request).await
}

async fn read_response(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Register a user and return the issued token.
pub async fn register(app: &Router, name: &str, email: &str, password: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/users",
        None,
        Some(json!({ "name": name, "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "registration failed: {}", json);
    json["token"].as_str().unwrap().to_string()
}

/// Public id of a registered user.
pub async fn user_uuid(db: &Database, email: &str) -> String {
    db.users().get_by_email(email).await.unwrap().unwrap().uuid
}

/// Create a post and return its id.
pub async fn create_post(app: &Router, token: &str, text: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/posts",
        Some(token),
        Some(json!({ "text": text })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "post creation failed: {}", json);
    json["id"].as_str().unwrap().to_string()
}

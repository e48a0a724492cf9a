//! Account registration.

use axum::{Json, Router, extract::State, middleware, response::IntoResponse, routing::post};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::error::{ApiError, ResultExt};
use super::validation::{FieldOrder, ValidateJson, hashable_password, not_blank};
use crate::avatar::gravatar_url;
use crate::db::{Database, NewUser, is_unique_violation};
use crate::jwt::{JwtConfig, UserClaim};
use crate::password::PasswordHasher;
use crate::rate_limit::{RateLimitConfig, rate_limit_register};

const USER_EXISTS: &str = "User already exists";

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub hasher: PasswordHasher,
    pub rate_limit: Option<Arc<RateLimitConfig>>,
}

pub fn router(state: UsersState) -> Router {
    let router = Router::new()
        .route("/", post(register))
        .with_state(state.clone());

    match state.rate_limit {
        Some(config) => {
            router.route_layer(middleware::from_fn_with_state(config, rate_limit_register))
        }
        None => router,
    }
}

#[derive(Deserialize, Validate)]
struct RegisterRequest {
    #[validate(
        required(message = "Name is required"),
        custom(function = "not_blank", message = "Name is required")
    )]
    name: Option<String>,
    #[validate(
        required(message = "Please include a valid email"),
        email(message = "Please include a valid email")
    )]
    email: Option<String>,
    #[validate(
        required(message = "Please enter a password with 6 or more characters"),
        length(min = 6, message = "Please enter a password with 6 or more characters"),
        custom(
            function = "hashable_password",
            message = "Please enter a password of at most 71 bytes"
        )
    )]
    password: Option<String>,
}

impl FieldOrder for RegisterRequest {
    const FIELDS: &'static [&'static str] = &["name", "email", "password"];
}

#[derive(Serialize)]
pub(super) struct TokenResponse {
    pub token: String,
}

async fn register(
    State(state): State<UsersState>,
    ValidateJson(payload): ValidateJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.name.unwrap_or_default();
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    let (name, email) = (name.trim(), email.trim());

    let existing = state
        .db
        .users()
        .get_by_email(email)
        .await
        .db_err("Failed to look up user")?;
    if existing.is_some() {
        return Err(ApiError::rejected(USER_EXISTS));
    }

    let hasher = state.hasher;
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .internal_err("Password hashing task failed")?
        .internal_err("Failed to hash password")?;

    let uuid = uuid::Uuid::new_v4().to_string();
    let avatar = gravatar_url(email);

    let created = state
        .db
        .users()
        .create(&NewUser {
            uuid: &uuid,
            name,
            email,
            password_hash: &password_hash,
            avatar: &avatar,
        })
        .await;

    match created {
        Ok(_) => {}
        // Lost a race with a concurrent registration for the same email
        Err(e) if is_unique_violation(&e) => return Err(ApiError::rejected(USER_EXISTS)),
        Err(e) => return Err(ApiError::db_error("Failed to create user", e)),
    }

    info!(user = %uuid, "User registered");

    let issued = state
        .jwt
        .issue(UserClaim { id: uuid })
        .internal_err("Failed to issue token")?;

    Ok(Json(TokenResponse {
        token: issued.token,
    }))
}

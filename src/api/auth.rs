//! Login and current-user lookup.

use axum::{
    Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use super::error::{ApiError, ResultExt};
use super::users::TokenResponse;
use super::validation::{FieldOrder, ValidateJson, not_blank};
use super::{Gates, load_caller};
use crate::auth::Identity;
use crate::db::Database;
use crate::jwt::{JwtConfig, UserClaim};
use crate::password::PasswordHasher;
use crate::rate_limit::{RateLimitConfig, rate_limit_login};

/// Same message for unknown email and wrong password.
const INVALID_CREDENTIALS: &str = "Invalid Credentials";

#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub hasher: PasswordHasher,
    pub rate_limit: Option<Arc<RateLimitConfig>>,
}

pub fn router(state: AuthState, gates: &Gates) -> Router {
    let me_router = gates
        .protect(Router::new().route("/", get(me)))
        .with_state(state.clone());

    let login_router = Router::new()
        .route("/", post(login))
        .with_state(state.clone());
    let login_router = match state.rate_limit {
        Some(config) => {
            login_router.route_layer(middleware::from_fn_with_state(config, rate_limit_login))
        }
        None => login_router,
    };

    Router::new().merge(me_router).merge(login_router)
}

#[derive(Deserialize, Validate)]
struct LoginRequest {
    #[validate(
        required(message = "Please include a valid email"),
        email(message = "Please include a valid email")
    )]
    email: Option<String>,
    #[validate(
        required(message = "Password is required"),
        custom(function = "not_blank", message = "Password is required")
    )]
    password: Option<String>,
}

impl FieldOrder for LoginRequest {
    const FIELDS: &'static [&'static str] = &["email", "password"];
}

/// The caller's account, without the password hash.
#[derive(Serialize)]
struct MeResponse {
    id: String,
    name: String,
    email: String,
    avatar: String,
    date: String,
}

async fn me(
    State(state): State<AuthState>,
    Identity(identity): Identity,
) -> Result<impl IntoResponse, ApiError> {
    let user = load_caller(&state.db, &identity).await?;

    Ok(Json(MeResponse {
        id: user.uuid,
        name: user.name,
        email: user.email,
        avatar: user.avatar,
        date: user.created_at,
    }))
}

async fn login(
    State(state): State<AuthState>,
    ValidateJson(payload): ValidateJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.unwrap_or_default();
    let email = email.trim();
    let password = payload.password.unwrap_or_default();

    let Some(user) = state
        .db
        .users()
        .get_by_email(email)
        .await
        .db_err("Failed to look up user")?
    else {
        return Err(ApiError::rejected(INVALID_CREDENTIALS));
    };

    let hasher = state.hasher;
    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
        .await
        .internal_err("Password verification task failed")?
        .internal_err("Failed to verify password")?;

    if !matches {
        warn!(user = %user.uuid, "Login with wrong password");
        return Err(ApiError::rejected(INVALID_CREDENTIALS));
    }

    info!(user = %user.uuid, "User logged in");

    let issued = state
        .jwt
        .issue(UserClaim { id: user.uuid })
        .internal_err("Failed to issue token")?;

    Ok(Json(TokenResponse {
        token: issued.token,
    }))
}

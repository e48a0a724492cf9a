mod auth;
mod error;
mod posts;
mod profile;
mod users;
mod validation;

use axum::{Router, middleware};
use std::sync::Arc;

use crate::auth::{AuthError, GateChain, RequestIdentity, TokenGate, enforce};
use crate::db::{Database, User};
use crate::jwt::JwtConfig;
use crate::password::PasswordHasher;
use crate::rate_limit::RateLimitConfig;

pub use error::{ApiError, ResultExt};
pub use validation::{FieldError, ValidationErrors};

/// Middleware layer running the gate chain in front of protected routes.
#[derive(Clone)]
pub(crate) struct Gates(Arc<GateChain>);

impl Gates {
    pub(crate) fn protect<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(self.0.clone(), enforce))
    }
}

/// Create the API router.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    hasher: PasswordHasher,
    rate_limit: Option<Arc<RateLimitConfig>>,
) -> Router {
    let gates = Gates(Arc::new(GateChain::new().with(TokenGate::new(jwt.clone()))));

    let users_state = users::UsersState {
        db: db.clone(),
        jwt: jwt.clone(),
        hasher,
        rate_limit: rate_limit.clone(),
    };

    let auth_state = auth::AuthState {
        db: db.clone(),
        jwt,
        hasher,
        rate_limit,
    };

    let profile_state = profile::ProfileState { db: db.clone() };

    let posts_state = posts::PostsState { db };

    Router::new()
        .nest("/users", users::router(users_state))
        .nest("/auth", auth::router(auth_state, &gates))
        .nest("/profile", profile::router(profile_state, &gates))
        .nest("/posts", posts::router(posts_state, &gates))
}

/// Load the credential record of the authenticated caller.
///
/// A token can outlive its account; such a token is treated as invalid.
async fn load_caller(db: &Database, identity: &RequestIdentity) -> Result<User, ApiError> {
    db.users()
        .get_by_uuid(&identity.user_id)
        .await
        .db_err("Failed to load user")?
        .ok_or_else(|| ApiError::unauthorized(AuthError::InvalidToken.message()))
}

pub mod api;
pub mod auth;
pub mod avatar;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit;

use api::create_api_router;
use axum::Router;
use db::Database;
use jwt::{JwtConfig, JwtError};
use password::{PasswordError, PasswordHasher};
use rate_limit::RateLimitConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Lifetime of issued tokens in seconds
    pub token_ttl_secs: u64,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
    /// Register/login attempts per minute per IP, 0 disables rate limiting
    pub auth_rate_limit_per_minute: u32,
    /// Key rate limits by X-Forwarded-For (requires running behind a proxy)
    pub trust_forwarded_for: bool,
}

/// Invalid server configuration detected while building the app.
#[derive(Debug)]
pub enum ConfigError {
    Jwt(JwtError),
    Password(PasswordError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Jwt(e) => write!(f, "Invalid token configuration: {}", e),
            ConfigError::Password(e) => write!(f, "Invalid password configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Result<Router, ConfigError> {
    let jwt = Arc::new(
        JwtConfig::new(&config.jwt_secret, config.token_ttl_secs).map_err(ConfigError::Jwt)?,
    );
    let hasher = PasswordHasher::new(config.bcrypt_cost).map_err(ConfigError::Password)?;
    let rate_limit = RateLimitConfig::new(
        config.auth_rate_limit_per_minute,
        config.trust_forwarded_for,
    )
    .map(Arc::new);

    let api_router = create_api_router(config.db.clone(), jwt, hasher, rate_limit);

    Ok(Router::new().nest("/api", api_router))
}

/// Serve the application on the given listener until the server exits.
///
/// Client socket addresses are recorded for rate limiting.
pub async fn run_server(app: Router, listener: TcpListener) -> Result<(), std::io::Error> {
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

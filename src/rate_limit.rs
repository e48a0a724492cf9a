//! Rate limiting for credential endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password
//! guessing and signup spam.

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use serde::Serialize;
use std::{num::NonZeroU32, sync::Arc};
use tracing::warn;

use crate::auth::extract_client_ip;

/// Default number of credential requests per minute per IP.
pub const DEFAULT_PER_MINUTE: u32 = 10;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting configuration for register and login.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Per-IP limiter for registration
    pub register: Arc<IpLimiter>,
    /// Per-IP limiter for login
    pub login: Arc<IpLimiter>,
    /// Key clients by the first `X-Forwarded-For` address
    pub trust_forwarded_for: bool,
}

impl RateLimitConfig {
    /// Create limiters allowing `per_minute` requests per IP on each endpoint.
    /// Returns None when `per_minute` is zero (rate limiting disabled).
    pub fn new(per_minute: u32, trust_forwarded_for: bool) -> Option<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute)?);

        Some(Self {
            register: Arc::new(RateLimiter::keyed(quota)),
            login: Arc::new(RateLimiter::keyed(quota)),
            trust_forwarded_for,
        })
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    msg: &'static str,
}

fn check(
    limiter: &IpLimiter,
    request: &Request,
    trust_forwarded_for: bool,
) -> Result<(), Response> {
    // Requests without a known address share one bucket.
    let ip = extract_client_ip(request, trust_forwarded_for).unwrap_or_else(|| "unknown".into());

    limiter.check_key(&ip).map_err(|_| {
        warn!(ip = %ip, path = %request.uri().path(), "Rate limit exceeded");
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                msg: "Too many requests",
            }),
        )
            .into_response()
    })
}

/// Middleware for rate limiting registration.
pub async fn rate_limit_register(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match check(&config.register, &request, config.trust_forwarded_for) {
        Ok(()) => next.run(request).await,
        Err(response) => response,
    }
}

/// Middleware for rate limiting login.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match check(&config.login, &request, config.trust_forwarded_for) {
        Ok(()) => next.run(request).await,
        Err(response) => response,
    }
}

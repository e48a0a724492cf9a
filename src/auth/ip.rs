//! Client IP extraction utilities.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};

/// Header set by a reverse proxy with the original client address.
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Extract the client IP address.
///
/// With `trust_forwarded_for`, the first address in `X-Forwarded-For` wins
/// (only safe behind a proxy that overwrites the header). Otherwise, and as a
/// fallback, the socket address from `ConnectInfo` is used.
pub fn extract_client_ip<B>(request: &Request<B>, trust_forwarded_for: bool) -> Option<String> {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get(FORWARDED_FOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return Some(ip.to_string());
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
}

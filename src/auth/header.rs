//! Token header parsing.

use axum::http::HeaderMap;

/// Header carrying the token on protected requests.
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Extract the token from the request headers.
///
/// A header that is missing, empty, or not valid visible ASCII counts as no token.
pub fn get_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(TOKEN_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() { None } else { Some(value) }
}

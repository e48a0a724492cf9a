//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Token verification failures.
///
/// Only two messages exist so a client cannot tell a forged token from an
/// expired or malformed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    NoToken,
    InvalidToken,
}

impl AuthError {
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::NoToken => "No token. Authorization is denied",
            AuthError::InvalidToken => "Token is not valid",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            msg: &'static str,
        }

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                msg: self.message(),
            }),
        )
            .into_response()
    }
}

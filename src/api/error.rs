//! Shared error handling for API endpoints.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error};

use super::validation::ValidationErrors;
use crate::auth::NotAuthorized;

/// Message shown to clients for any unexpected failure.
pub const SERVER_ERROR: &str = "Server Error";

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    fn db_err(self, msg: &str) -> Result<T, ApiError>;
    fn internal_err(self, msg: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn db_err(self, msg: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::db_error(msg, e))
    }
    fn internal_err(self, msg: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::internal_error(msg, e))
    }
}

/// API error type with automatic response conversion.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Validation(ValidationErrors),
    NotFound(String),
    Unauthorized(String),
    Internal,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// A validation-style error carrying a single message and no field.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors::single(msg))
    }

    pub fn db_error(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal
    }

    pub fn internal_error(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal
    }
}

impl From<NotAuthorized> for ApiError {
    fn from(e: NotAuthorized) -> Self {
        Self::Unauthorized(e.to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let msg = match &rejection {
            JsonRejection::JsonDataError(_) => "Invalid request data format",
            JsonRejection::JsonSyntaxError(_) => "Invalid JSON syntax in request body",
            JsonRejection::MissingJsonContentType(_) => "Content-Type must be application/json",
            JsonRejection::BytesRejection(_) => "Failed to read request body",
            _ => return Self::internal_error("Unexpected JSON rejection", rejection.body_text()),
        };
        debug!(error = %rejection.body_text(), "Rejected request body");
        Self::rejected(msg)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    msg: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR.to_string()),
        };
        (status, Json(ErrorResponse { msg: message })).into_response()
    }
}

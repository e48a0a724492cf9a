//! Resource ownership checks.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::types::RequestIdentity;

/// The caller is authenticated but does not own the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotAuthorized;

impl NotAuthorized {
    pub const MESSAGE: &'static str = "User not authorized";
}

impl std::fmt::Display for NotAuthorized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(Self::MESSAGE)
    }
}

impl std::error::Error for NotAuthorized {}

impl IntoResponse for NotAuthorized {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            msg: &'static str,
        }

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                msg: Self::MESSAGE,
            }),
        )
            .into_response()
    }
}

/// Canonical string form of a user identifier.
/// UUIDs compare by value regardless of case or braces; anything else by trimmed text.
pub fn canonical_id(id: &str) -> String {
    let id = id.trim();
    match uuid::Uuid::parse_str(id) {
        Ok(uuid) => uuid.hyphenated().to_string(),
        Err(_) => id.to_string(),
    }
}

/// Check that `identity` is the recorded owner of a resource.
///
/// Call after the resource lookup succeeded and before mutating it.
pub fn assert_owner(
    resource_owner_id: &str,
    identity: &RequestIdentity,
) -> Result<(), NotAuthorized> {
    if canonical_id(resource_owner_id) == canonical_id(&identity.user_id) {
        Ok(())
    } else {
        Err(NotAuthorized)
    }
}

//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::AuthError;
use super::types::RequestIdentity;

/// Extractor for the identity attached by [`super::TokenGate`].
///
/// Only valid behind the gate chain; on an ungated route it rejects as if no
/// token had been sent.
pub struct Identity(pub RequestIdentity);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestIdentity>()
            .cloned()
            .map(Identity)
            .ok_or(AuthError::NoToken)
    }
}

//! Authentication user types.

/// Verified identity attached to a single request.
///
/// Inserted into the request extensions by [`super::TokenGate`] and dropped
/// with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    /// Public user identifier from the token claim
    pub user_id: String,
}

impl RequestIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

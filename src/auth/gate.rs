//! Request gates run in order before protected handlers.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::errors::AuthError;
use super::header::get_token;
use super::types::RequestIdentity;
use crate::jwt::JwtConfig;

/// Outcome of a single gate.
pub enum Flow {
    /// Hand the request to the next gate (or the handler).
    Continue,
    /// Stop here and send this response.
    Halt(Response),
}

/// A stage in the request pipeline. May mutate the request parts.
pub trait RequestGate: Send + Sync {
    fn check(&self, parts: &mut Parts) -> Flow;
}

/// Ordered list of gates. The first gate to halt decides the response.
#[derive(Clone, Default)]
pub struct GateChain {
    gates: Vec<Arc<dyn RequestGate>>,
}

impl GateChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a gate to the end of the chain.
    pub fn with(mut self, gate: impl RequestGate + 'static) -> Self {
        self.gates.push(Arc::new(gate));
        self
    }

    /// Run every gate in order.
    pub fn run(&self, parts: &mut Parts) -> Flow {
        for gate in &self.gates {
            if let Flow::Halt(response) = gate.check(parts) {
                return Flow::Halt(response);
            }
        }
        Flow::Continue
    }
}

/// Middleware that runs a [`GateChain`] before the inner service.
pub async fn enforce(
    State(chain): State<Arc<GateChain>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    match chain.run(&mut parts) {
        Flow::Continue => next.run(Request::from_parts(parts, body)).await,
        Flow::Halt(response) => response,
    }
}

/// Verifies the request token and attaches the caller's identity.
#[derive(Clone)]
pub struct TokenGate {
    jwt: Arc<JwtConfig>,
}

impl TokenGate {
    pub fn new(jwt: Arc<JwtConfig>) -> Self {
        Self { jwt }
    }

    /// Verify signature and expiry of the token in `headers`.
    pub fn verify(&self, headers: &HeaderMap) -> Result<RequestIdentity, AuthError> {
        let token = get_token(headers).ok_or(AuthError::NoToken)?;

        let claims = self.jwt.validate(token).map_err(|e| {
            debug!(error = %e, "Rejected token");
            AuthError::InvalidToken
        })?;

        Ok(RequestIdentity::new(claims.user.id))
    }
}

impl RequestGate for TokenGate {
    fn check(&self, parts: &mut Parts) -> Flow {
        match self.verify(&parts.headers) {
            Ok(identity) => {
                parts.extensions.insert(identity);
                Flow::Continue
            }
            Err(e) => Flow::Halt(e.into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::UserClaim;
    use axum::http::{HeaderValue, StatusCode};

    fn jwt() -> Arc<JwtConfig> {
        Arc::new(JwtConfig::new(b"gate-test-secret", 60).unwrap())
    }

    fn parts_with_token(token: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("/api/posts");
        if let Some(token) = token {
            builder = builder.header("x-auth-token", HeaderValue::from_str(token).unwrap());
        }
        builder.body(()).unwrap().into_parts().0
    }

    struct Halting(StatusCode);

    impl RequestGate for Halting {
        fn check(&self, _parts: &mut Parts) -> Flow {
            Flow::Halt(self.0.into_response())
        }
    }

    struct Marking;

    impl RequestGate for Marking {
        fn check(&self, parts: &mut Parts) -> Flow {
            parts.extensions.insert(RequestIdentity::new("marked"));
            Flow::Continue
        }
    }

    #[test]
    fn test_token_gate_accepts_valid_token() {
        let jwt = jwt();
        let token = jwt
            .issue(UserClaim {
                id: "uuid-123".to_string(),
            })
            .unwrap()
            .token;
        let gate = TokenGate::new(jwt);
        let mut parts = parts_with_token(Some(&token));

        assert!(matches!(gate.check(&mut parts), Flow::Continue));
        assert_eq!(
            parts.extensions.get::<RequestIdentity>(),
            Some(&RequestIdentity::new("uuid-123"))
        );
    }

    #[test]
    fn test_token_gate_missing_token() {
        let gate = TokenGate::new(jwt());
        let parts = parts_with_token(None);

        assert_eq!(gate.verify(&parts.headers), Err(AuthError::NoToken));
    }

    #[test]
    fn test_token_gate_invalid_token() {
        let gate = TokenGate::new(jwt());
        let mut parts = parts_with_token(Some("not.a.token"));

        assert_eq!(gate.verify(&parts.headers), Err(AuthError::InvalidToken));
        match gate.check(&mut parts) {
            Flow::Halt(response) => assert_eq!(response.status(), StatusCode::UNAUTHORIZED),
            Flow::Continue => panic!("invalid token should halt"),
        }
        assert!(parts.extensions.get::<RequestIdentity>().is_none());
    }

    #[test]
    fn test_token_gate_foreign_secret() {
        let other = JwtConfig::new(b"some-other-secret", 60).unwrap();
        let token = other
            .issue(UserClaim {
                id: "uuid-123".to_string(),
            })
            .unwrap()
            .token;
        let gate = TokenGate::new(jwt());
        let parts = parts_with_token(Some(&token));

        assert_eq!(gate.verify(&parts.headers), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_chain_stops_at_first_halt() {
        let chain = GateChain::new()
            .with(Halting(StatusCode::IM_A_TEAPOT))
            .with(Marking);
        let mut parts = parts_with_token(None);

        match chain.run(&mut parts) {
            Flow::Halt(response) => assert_eq!(response.status(), StatusCode::IM_A_TEAPOT),
            Flow::Continue => panic!("chain should halt"),
        }
        assert!(parts.extensions.get::<RequestIdentity>().is_none());
    }

    #[test]
    fn test_chain_runs_gates_in_order() {
        let chain = GateChain::new()
            .with(Marking)
            .with(Halting(StatusCode::IM_A_TEAPOT));
        let mut parts = parts_with_token(None);

        assert!(matches!(chain.run(&mut parts), Flow::Halt(_)));
        assert!(parts.extensions.get::<RequestIdentity>().is_some());
    }

    #[test]
    fn test_empty_chain_continues() {
        let chain = GateChain::new();
        let mut parts = parts_with_token(None);

        assert!(matches!(chain.run(&mut parts), Flow::Continue));
    }
}

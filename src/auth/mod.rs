//! Token authentication and ownership checks.
//!
//! Protected routes run a [`GateChain`] as middleware. The [`TokenGate`]
//! verifies the `x-auth-token` header and stores a [`RequestIdentity`] in the
//! request extensions, where handlers pick it up with the [`Identity`]
//! extractor. Handlers call [`assert_owner`] before mutating a resource.

mod errors;
mod extractors;
mod gate;
mod guard;
mod header;
mod ip;
mod types;

pub use errors::AuthError;
pub use extractors::Identity;
pub use gate::{Flow, GateChain, RequestGate, TokenGate, enforce};
pub use guard::{NotAuthorized, assert_owner, canonical_id};
pub use header::{TOKEN_HEADER, get_token};
pub use ip::extract_client_ip;
pub use types::RequestIdentity;

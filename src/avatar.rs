//! Gravatar URLs for new accounts.

use sha2::{Digest, Sha256};

const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar/";

/// Build the avatar URL for an email address.
///
/// Gravatar keys images by the SHA-256 of the trimmed, lowercased address.
/// Unknown addresses fall back to the "mystery man" image.
pub fn gravatar_url(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    format!("{}{:x}?s=200&r=pg&d=mm", GRAVATAR_BASE, digest)
}

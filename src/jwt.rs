//! JWT token generation and validation.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default token lifetime: 1 hour.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 60 * 60;

/// The user part of the identity claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaim {
    /// Public user identifier (UUID)
    pub id: String,
}

/// JWT claims. Carries only the user identifier, never personal data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: UserClaim,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Result of issuing a token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The JWT token string
    pub token: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
}

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret and token lifetime.
    pub fn new(secret: &[u8], ttl_secs: u64) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::MissingSecret);
        }
        if ttl_secs == 0 {
            return Err(JwtError::InvalidTtl);
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_secs,
        })
    }

    /// Configured token lifetime in seconds.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a token for a user with the configured lifetime.
    pub fn issue(&self, claim: UserClaim) -> Result<IssuedToken, JwtError> {
        self.issue_at(claim, self.ttl_secs, now()?)
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        claim: UserClaim,
        ttl_secs: u64,
        now: u64,
    ) -> Result<IssuedToken, JwtError> {
        let exp = now.checked_add(ttl_secs).ok_or(JwtError::InvalidTtl)?;

        let claims = Claims {
            user: claim,
            iat: now,
            exp,
        };

        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
                .map_err(JwtError::Encoding)?;

        Ok(IssuedToken {
            token,
            issued_at: now,
            expires_at: exp,
        })
    }

    /// Validate and decode a token against the current time.
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_at(token, now()?)
    }

    /// Validate and decode a token as if the current time were `now`.
    /// A token is valid on `[iat, exp)`.
    pub fn validate_at(&self, token: &str, now: u64) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below so that `exp` itself is already expired.
        validation.validate_exp = false;
        validation.leeway = 0;

        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(JwtError::Decoding)?;

        if now >= token_data.claims.exp {
            return Err(JwtError::Expired);
        }

        Ok(token_data.claims)
    }
}

fn now() -> Result<u64, JwtError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| JwtError::TimeError)?
        .as_secs())
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// No signing secret configured
    MissingSecret,
    /// Token lifetime is zero or overflows
    InvalidTtl,
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Error decoding the token (bad signature, malformed, wrong algorithm)
    Decoding(jsonwebtoken::errors::Error),
    /// Token is past its expiry
    Expired,
    /// System time error
    TimeError,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::MissingSecret => write!(f, "JWT secret is not configured"),
            JwtError::InvalidTtl => write!(f, "Invalid token lifetime"),
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
            JwtError::Expired => write!(f, "Token has expired"),
            JwtError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for JwtError {}

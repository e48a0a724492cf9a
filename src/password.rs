//! Salted one-way password hashing.
//!
//! Hashes are bcrypt strings: the salt and cost are embedded in the stored
//! value, so verification needs nothing but the stored hash. bcrypt only
//! reads the first 72 bytes of its input, so longer passwords are refused
//! instead of being silently cut.

/// Default bcrypt cost. Roughly 50-100ms per hash on current server hardware.
pub const DEFAULT_COST: u32 = 10;

/// Lowest cost bcrypt accepts. Only suitable for tests.
pub const MIN_COST: u32 = 4;

/// Highest cost bcrypt accepts.
pub const MAX_COST: u32 = 31;

/// Longest password bcrypt hashes without truncation, in bytes. The 72 byte
/// key includes a terminating NUL.
pub const MAX_PASSWORD_BYTES: usize = 71;

/// Password hasher with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost.
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(PasswordError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        bcrypt::non_truncating_hash(plaintext, self.cost).map_err(|e| match e {
            bcrypt::BcryptError::Truncation(len) => PasswordError::TooLong(len),
            e => PasswordError::Hashing(e),
        })
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch, including for plaintexts too long to
    /// have been hashed. An error means the stored hash itself could not be
    /// parsed.
    pub fn verify(&self, plaintext: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        match bcrypt::non_truncating_verify(plaintext, stored_hash) {
            Ok(matches) => Ok(matches),
            Err(bcrypt::BcryptError::Truncation(_)) => Ok(false),
            Err(e) => Err(PasswordError::MalformedHash(e)),
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

/// Errors that can occur while hashing or verifying passwords.
#[derive(Debug)]
pub enum PasswordError {
    /// Cost outside of the range bcrypt supports
    InvalidCost(u32),
    /// Plaintext longer than bcrypt can hash (key length bcrypt reported)
    TooLong(usize),
    /// Error producing a hash
    Hashing(bcrypt::BcryptError),
    /// Stored hash could not be parsed
    MalformedHash(bcrypt::BcryptError),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordError::InvalidCost(cost) => write!(
                f,
                "Invalid bcrypt cost {} (must be between {} and {})",
                cost, MIN_COST, MAX_COST
            ),
            PasswordError::TooLong(_) => {
                write!(f, "Password is longer than {} bytes", MAX_PASSWORD_BYTES)
            }
            PasswordError::Hashing(e) => write!(f, "Failed to hash password: {}", e),
            PasswordError::MalformedHash(e) => write!(f, "Malformed password hash: {}", e),
        }
    }
}

impl std::error::Error for PasswordError {}

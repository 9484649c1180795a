//! Password hashing utilities
//!
//! Web passwords are stored as bcrypt hashes. Portal secrets are not hashed:
//! they must be replayed to the portal on every login.

use bcrypt::{hash, verify};

use crate::shared::InfraError;

/// Hash a password using bcrypt
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, InfraError> {
    hash(password, cost).map_err(|e| InfraError::Crypto(e.to_string()))
}

/// Verify a password against a hash. A malformed hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    verify(password, hash).unwrap_or(false)
}

/// Whether `value` looks like a bcrypt hash rather than a legacy plaintext entry.
pub fn is_bcrypt_hash(value: &str) -> bool {
    value.len() == 60 && ["$2a$", "$2b$", "$2x$", "$2y$"].iter().any(|p| value.starts_with(p))
}

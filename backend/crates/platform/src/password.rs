//! Password Hashing and Verification
//!
//! One-way adaptive password handling for the local credential directory:
//! - Argon2id hashing (memory-hard, recommended by OWASP)
//! - Zeroization of sensitive data
//! - Constant-time comparison (inside argon2)
//!
//! Password *policy* (length rules, breach checks) is the credential
//! directory's concern, not this module's; only minimal structural checks
//! are applied here so hashing input stays bounded.

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Upper bound on cleartext length fed to Argon2 (characters)
pub const MAX_SECRET_LENGTH: usize = 128;

// ============================================================================
// Error Types
// ============================================================================

/// Structural secret errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretShapeError {
    /// Secret contains only whitespace or nothing at all
    #[error("Secret cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    /// Secret is too long to hash
    #[error("Secret must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    /// Secret contains control characters
    #[error("Secret contains invalid control characters")]
    InvalidCharacter,
}

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Hashing operation failed
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Invalid hash format
    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear Text Secret (Zeroized on drop)
// ============================================================================

/// Clear text secret with automatic memory zeroization
///
/// Ensures the secret is securely erased from memory when dropped.
///
/// ## Security
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextSecret(String);

impl ClearTextSecret {
    /// Create a new clear text secret
    ///
    /// Unicode is normalized using NFKC before any further processing so the
    /// same logical secret always hashes identically.
    pub fn new(raw: String) -> Result<Self, SecretShapeError> {
        let normalized: String = raw.nfkc().collect();

        if normalized.trim().is_empty() {
            return Err(SecretShapeError::EmptyOrWhitespace);
        }

        let char_count = normalized.chars().count();
        if char_count > MAX_SECRET_LENGTH {
            return Err(SecretShapeError::TooLong {
                max: MAX_SECRET_LENGTH,
                actual: char_count,
            });
        }

        for ch in normalized.chars() {
            if ch.is_control() {
                return Err(SecretShapeError::InvalidCharacter);
            }
        }

        Ok(Self(normalized))
    }

    /// Get the secret as bytes for hashing
    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hash the secret using Argon2id
    ///
    /// ## Returns
    /// PHC-formatted hash string wrapped in `HashedSecret`
    pub fn hash(&self) -> Result<HashedSecret, PasswordHashError> {
        // Random 128-bit salt per hash
        let salt = SaltString::generate(OsRng);

        // Argon2::default() carries the OWASP-recommended Argon2id parameters
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(self.as_bytes(), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedSecret {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextSecret")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Secret (Safe to store)
// ============================================================================

/// Hashed secret in PHC string format
///
/// Stores the Argon2id hash in PHC format: algorithm identifier, version,
/// parameters, salt and hash in one string.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedSecret {
    hash: String,
}

impl HashedSecret {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();

        // Validate it's a valid PHC string
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;

        Ok(Self { hash })
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a secret against this hash
    ///
    /// Argon2 uses constant-time comparison internally.
    pub fn verify(&self, secret: &ClearTextSecret) -> bool {
        let parsed_hash = match PasswordHash::new(&self.hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

impl fmt::Debug for HashedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedSecret")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let secret = ClearTextSecret::new("correct horse battery".to_string()).unwrap();
        let hashed = secret.hash().unwrap();

        assert!(hashed.verify(&secret));

        let wrong = ClearTextSecret::new("incorrect horse".to_string()).unwrap();
        assert!(!hashed.verify(&wrong));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let secret = ClearTextSecret::new("some secret value".to_string()).unwrap();
        let hashed = secret.hash().unwrap();

        let restored = HashedSecret::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&secret));
    }

    #[test]
    fn test_invalid_phc_string_rejected() {
        assert!(HashedSecret::from_phc_string("not-a-phc-string").is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            ClearTextSecret::new("   ".to_string()),
            Err(SecretShapeError::EmptyOrWhitespace)
        ));
    }

    #[test]
    fn test_overlong_secret_rejected() {
        let long = "x".repeat(MAX_SECRET_LENGTH + 1);
        assert!(matches!(
            ClearTextSecret::new(long),
            Err(SecretShapeError::TooLong { .. })
        ));
    }

    #[test]
    fn test_control_characters_rejected() {
        assert!(matches!(
            ClearTextSecret::new("pass\u{0000}word".to_string()),
            Err(SecretShapeError::InvalidCharacter)
        ));
    }

    #[test]
    fn test_nfkc_normalization_is_stable() {
        // Composed and decomposed forms of "é" hash to the same secret
        let composed = ClearTextSecret::new("caf\u{00e9} passphrase".to_string()).unwrap();
        let decomposed = ClearTextSecret::new("cafe\u{0301} passphrase".to_string()).unwrap();

        let hashed = composed.hash().unwrap();
        assert!(hashed.verify(&decomposed));
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = ClearTextSecret::new("super secret".to_string()).unwrap();
        let dbg = format!("{:?}", secret);
        assert!(!dbg.contains("super secret"));
        assert!(dbg.contains("REDACTED"));
    }
}

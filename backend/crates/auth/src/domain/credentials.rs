//! Credentials Value Object
//!
//! 生のログイン入力に対する構文ガード。ここを通過しない入力は
//! いかなるプロバイダにも到達しない。
//!
//! ## 設計方針
//! - identity は制限的な許可リスト（英数字 + `@._-`、3〜100文字）
//! - identity / secret ともに拒否リスト文字を含むと即時失敗
//!   （マークアップ/SQL 風のインジェクションが下流プロバイダや
//!   ログへ届くのを防ぐ）
//! - 純粋関数、副作用なし、I/O なし

use std::fmt;

use derive_more::Display;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Minimum identity length (in characters)
pub const IDENTITY_MIN_LENGTH: usize = 3;

/// Maximum identity length (in characters)
pub const IDENTITY_MAX_LENGTH: usize = 100;

/// Maximum secret length (in characters)
pub const SECRET_MAX_LENGTH: usize = 128;

/// Special characters permitted in an identity besides ASCII alphanumerics
const IDENTITY_ALLOWED_SPECIAL: &[char] = &['@', '.', '_', '-'];

/// Characters rejected in either field
///
/// Markup/SQL-style metacharacters; none of them appear in legitimate
/// identities, and rejecting them in secrets keeps them out of any
/// downstream provider protocol or log line.
const FORBIDDEN_CHARS: &[char] = &['<', '>', '"', '\'', '%', ';', '(', ')', '&', '+'];

// ============================================================================
// Error Types
// ============================================================================

/// Error returned when credential validation fails
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialShapeError {
    /// Identity is absent or blank
    #[error("identity must not be blank")]
    IdentityMissing,

    /// Identity is shorter than [`IDENTITY_MIN_LENGTH`]
    #[error("identity must be at least {IDENTITY_MIN_LENGTH} characters")]
    IdentityTooShort,

    /// Identity exceeds [`IDENTITY_MAX_LENGTH`]
    #[error("identity must be at most {IDENTITY_MAX_LENGTH} characters")]
    IdentityTooLong,

    /// Identity contains a character outside the allow-list
    #[error("identity contains an invalid character")]
    IdentityInvalidCharacter,

    /// Secret is absent or blank
    #[error("secret must not be blank")]
    SecretMissing,

    /// Secret exceeds [`SECRET_MAX_LENGTH`]
    #[error("secret must be at most {SECRET_MAX_LENGTH} characters")]
    SecretTooLong,

    /// Either field contains a denylisted character
    #[error("{field} contains a forbidden character")]
    ForbiddenCharacter { field: &'static str },
}

// ============================================================================
// Identity
// ============================================================================

/// Login-facing unique name for a user (email-like string)
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Validate and wrap a raw identity string
    pub fn parse(raw: &str) -> Result<Self, CredentialShapeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CredentialShapeError::IdentityMissing);
        }

        if trimmed.chars().any(|c| FORBIDDEN_CHARS.contains(&c)) {
            return Err(CredentialShapeError::ForbiddenCharacter { field: "identity" });
        }

        let len = trimmed.chars().count();
        if len < IDENTITY_MIN_LENGTH {
            return Err(CredentialShapeError::IdentityTooShort);
        }
        if len > IDENTITY_MAX_LENGTH {
            return Err(CredentialShapeError::IdentityTooLong);
        }

        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || IDENTITY_ALLOWED_SPECIAL.contains(&c))
        {
            return Err(CredentialShapeError::IdentityInvalidCharacter);
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Secret
// ============================================================================

/// Raw login secret, validated for shape only
///
/// Never persisted; lives for the duration of one login call.
/// Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Validate and wrap a raw secret string
    pub fn parse(raw: &str) -> Result<Self, CredentialShapeError> {
        if raw.trim().is_empty() {
            return Err(CredentialShapeError::SecretMissing);
        }

        if raw.chars().any(|c| FORBIDDEN_CHARS.contains(&c)) {
            return Err(CredentialShapeError::ForbiddenCharacter { field: "secret" });
        }

        if raw.chars().count() > SECRET_MAX_LENGTH {
            return Err(CredentialShapeError::SecretTooLong);
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Validated login credentials
///
/// Construction is the Credential Validator: a `Credentials` value can only
/// exist if both fields passed the syntactic checks above.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub identity: Identity,
    pub secret: Secret,
}

impl Credentials {
    /// Validate raw login input
    ///
    /// Pure function; must run before any provider call.
    pub fn parse(raw_identity: &str, raw_secret: &str) -> Result<Self, CredentialShapeError> {
        Ok(Self {
            identity: Identity::parse(raw_identity)?,
            secret: Secret::parse(raw_secret)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_email_like_identity() {
        let creds = Credentials::parse("user@x.com", "hunter2!").unwrap();
        assert_eq!(creds.identity.as_str(), "user@x.com");
        assert_eq!(creds.secret.as_str(), "hunter2!");
    }

    #[test]
    fn test_trims_identity_whitespace() {
        let identity = Identity::parse("  user@x.com  ").unwrap();
        assert_eq!(identity.as_str(), "user@x.com");
    }

    #[test]
    fn test_blank_fields_rejected() {
        assert_eq!(
            Credentials::parse("", "secret").unwrap_err(),
            CredentialShapeError::IdentityMissing
        );
        assert_eq!(
            Credentials::parse("user@x.com", "   ").unwrap_err(),
            CredentialShapeError::SecretMissing
        );
    }

    #[test]
    fn test_identity_length_bounds() {
        assert_eq!(
            Identity::parse("ab").unwrap_err(),
            CredentialShapeError::IdentityTooShort
        );
        assert!(Identity::parse(&"a".repeat(IDENTITY_MAX_LENGTH)).is_ok());
        assert_eq!(
            Identity::parse(&"a".repeat(IDENTITY_MAX_LENGTH + 1)).unwrap_err(),
            CredentialShapeError::IdentityTooLong
        );
    }

    #[test]
    fn test_identity_allow_list() {
        assert!(Identity::parse("first.last_name-1@tenant.example").is_ok());
        assert_eq!(
            Identity::parse("user name").unwrap_err(),
            CredentialShapeError::IdentityInvalidCharacter
        );
        assert_eq!(
            Identity::parse("user#x.com").unwrap_err(),
            CredentialShapeError::IdentityInvalidCharacter
        );
    }

    #[test]
    fn test_forbidden_characters_rejected_in_both_fields() {
        for ch in ['<', '>', '"', '\'', '%', ';', '(', ')', '&', '+'] {
            let identity = format!("user{}x.com", ch);
            assert_eq!(
                Identity::parse(&identity).unwrap_err(),
                CredentialShapeError::ForbiddenCharacter { field: "identity" },
                "identity should reject {:?}",
                ch
            );

            let secret = format!("pass{}word", ch);
            assert_eq!(
                Secret::parse(&secret).unwrap_err(),
                CredentialShapeError::ForbiddenCharacter { field: "secret" },
                "secret should reject {:?}",
                ch
            );
        }
    }

    #[test]
    fn test_secret_length_bound() {
        assert!(Secret::parse(&"x".repeat(SECRET_MAX_LENGTH)).is_ok());
        assert_eq!(
            Secret::parse(&"x".repeat(SECRET_MAX_LENGTH + 1)).unwrap_err(),
            CredentialShapeError::SecretTooLong
        );
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::parse("top-secret").unwrap();
        assert!(!format!("{:?}", secret).contains("top-secret"));
    }
}

//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::kv::StoreError;
use thiserror::Error;

use crate::domain::credentials::CredentialShapeError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login input failed syntactic validation
    #[error("Invalid login request: {0}")]
    InvalidCredentialShape(#[from] CredentialShapeError),

    /// The directory rejected the credentials
    ///
    /// One message regardless of which field was wrong, so callers cannot
    /// probe which identities exist.
    #[error("Invalid identity or secret")]
    InvalidCredentials,

    /// Caller is in a brute-force block window
    #[error("Too many failed login attempts")]
    AccountBlocked {
        /// Seconds until the block expires
        retry_after_secs: i64,
    },

    /// No bearer token on a protected request
    #[error("Authentication required")]
    TokenMissing,

    /// Token signature is valid but the token has expired
    #[error("Token has expired")]
    TokenExpired,

    /// Token could not be parsed as a well-formed token
    #[error("Malformed authentication token")]
    TokenMalformed,

    /// Token signature or trust claims do not check out
    #[error("Invalid authentication token")]
    TokenSignatureInvalid,

    /// A newer login replaced this session
    #[error("Session has been superseded by a newer login")]
    SessionSuperseded,

    /// Credential directory unreachable or misbehaving
    #[error("Credential directory error: {0}")]
    Directory(String),

    /// Session store unreachable
    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentialShape(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::TokenMissing
            | AuthError::TokenExpired
            | AuthError::TokenMalformed
            | AuthError::TokenSignatureInvalid
            | AuthError::SessionSuperseded => StatusCode::UNAUTHORIZED,
            AuthError::AccountBlocked { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Directory(_) => StatusCode::BAD_GATEWAY,
            AuthError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentialShape(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials
            | AuthError::TokenMissing
            | AuthError::TokenExpired
            | AuthError::TokenMalformed
            | AuthError::TokenSignatureInvalid
            | AuthError::SessionSuperseded => ErrorKind::Unauthorized,
            AuthError::AccountBlocked { .. } => ErrorKind::TooManyRequests,
            AuthError::Directory(_) => ErrorKind::BadGateway,
            AuthError::Store(_) => ErrorKind::ServiceUnavailable,
            AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            AuthError::AccountBlocked { retry_after_secs } => {
                err.with_details(format!("Retry after {retry_after_secs} seconds"))
            }
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Directory(msg) => {
                tracing::error!(message = %msg, "Credential directory error");
            }
            AuthError::Store(e) => {
                tracing::error!(error = %e, "Session store error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountBlocked { retry_after_secs } => {
                tracing::warn!(retry_after_secs, "Login attempt while blocked");
            }
            AuthError::SessionSuperseded => {
                tracing::warn!("Request with superseded session token");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        let mut response = self.to_app_error().into_response();
        if let AuthError::AccountBlocked { retry_after_secs } = &self {
            // Retry-After は秒単位（RFC 9110）
            let secs = (*retry_after_secs).max(0);
            if let Ok(value) = secs.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::InvalidCredentialShape(CredentialShapeError::IdentityMissing).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::AccountBlocked {
                retry_after_secs: 30
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AuthError::SessionSuperseded.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Directory("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_invalid_credentials_message_is_generic() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid identity or secret"
        );
    }

    #[test]
    fn test_blocked_error_carries_retry_hint() {
        let err = AuthError::AccountBlocked {
            retry_after_secs: 42,
        };
        let app_err = err.to_app_error();
        assert_eq!(app_err.details(), Some("Retry after 42 seconds"));
    }
}

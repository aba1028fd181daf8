//! Credential Directory and Audit ports
//!
//! インフラ層が実装する境界。ディレクトリは資格情報を照合して
//! principal を返し、監査シンクは認証イベントを記録する。

use platform::client::ClientInfo;

use crate::domain::credentials::Credentials;
use crate::domain::principal::Principal;

/// Errors from a credential directory backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The directory rejected the credentials
    ///
    /// Deliberately carries no detail about which field was wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The directory could not be reached or answered abnormally
    #[error("credential directory unavailable: {0}")]
    Unavailable(String),
}

/// Port for credential verification backends
#[trait_variant::make(CredentialDirectory: Send)]
pub trait LocalCredentialDirectory {
    /// Check credentials and return the matching principal
    async fn authenticate(&self, credentials: &Credentials) -> Result<Principal, DirectoryError>;
}

/// One authentication event for the audit trail
#[derive(Debug)]
pub struct AuditEvent<'a> {
    /// Identity as submitted (validated shape, not necessarily existing)
    pub identity: &'a str,

    /// Originating client
    pub client: &'a ClientInfo,

    /// Whether authentication succeeded
    pub success: bool,

    /// Outcome classification (e.g. "login", "invalid_credentials", "blocked")
    pub detail: &'a str,
}

/// Port for audit event recording
///
/// Implementations must never fail the login flow; recording errors are
/// swallowed and logged by the implementation itself.
#[trait_variant::make(AuditSink: Send)]
pub trait LocalAuditSink {
    async fn record(&self, event: AuditEvent<'_>);
}

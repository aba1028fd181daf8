//! Auth (Authentication & Session Integrity) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Credentials, principal, session and attempt-state types
//! - `application/` - Login flow, token service, registry, brute-force guard
//! - `infra/` - Directory backends (Postgres / external REST) and audit sinks
//! - `presentation/` - HTTP handlers, DTOs, router, request gate middleware
//!
//! ## Features
//! - Credential login against a pluggable directory backend
//! - Signed bearer tokens (HMAC-SHA256) with issuer/audience trust checks
//! - Single active session per identity; a new login supersedes the old one
//! - Per-caller brute-force lockout keyed by a transport-session cookie
//!
//! ## Security Model
//! - Login input passes syntactic validation before any backend sees it
//! - Credential rejections never reveal whether the identity exists
//! - Tokens are only honored while their session is still the registered one
//! - Failure counters are keyed by hashed cookie values, never raw ones

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::{AnyDirectory, PgDirectory, RestDirectory, TracingAuditSink};
pub use presentation::router::{auth_router, gate_state};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::credentials::*;
    pub use crate::domain::principal::*;
    pub use crate::domain::session_record::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}

//! Infrastructure layer: directory backends and audit sinks

pub mod audit;
pub mod postgres;
pub mod rest;

use crate::domain::credentials::Credentials;
use crate::domain::directory::{CredentialDirectory, DirectoryError};
use crate::domain::principal::Principal;

pub use audit::TracingAuditSink;
pub use postgres::PgDirectory;
pub use rest::RestDirectory;

/// Directory backend selected at startup
///
/// Static dispatch per variant; which backend runs is a deployment
/// decision, not a per-request one.
pub enum AnyDirectory {
    Postgres(PgDirectory),
    Rest(RestDirectory),
}

impl CredentialDirectory for AnyDirectory {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Principal, DirectoryError> {
        match self {
            AnyDirectory::Postgres(directory) => directory.authenticate(credentials).await,
            AnyDirectory::Rest(directory) => directory.authenticate(credentials).await,
        }
    }
}

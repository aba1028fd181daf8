//! Postgres Credential Directory
//!
//! ローカル directory_users テーブルを照合するディレクトリ実装。
//! secret は Argon2id の PHC 文字列で保存されている前提。

use kernel::id::DirectoryUserId;
use sqlx::PgPool;

use platform::password::{ClearTextSecret, HashedSecret};

use crate::domain::credentials::Credentials;
use crate::domain::directory::{CredentialDirectory, DirectoryError};
use crate::domain::principal::Principal;

#[derive(sqlx::FromRow)]
struct DirectoryRow {
    id: uuid::Uuid,
    secret_hash: String,
    /// Role assignment order is preserved; the first entry is the
    /// default active role.
    roles: Vec<String>,
}

/// Credential directory backed by the tenant's Postgres database
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CredentialDirectory for PgDirectory {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Principal, DirectoryError> {
        let row = sqlx::query_as::<_, DirectoryRow>(
            r#"
            SELECT id, secret_hash, roles
            FROM directory_users
            WHERE identity = $1 AND enabled = TRUE
            "#,
        )
        .bind(credentials.identity.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;

        // 未知の identity と誤った secret を区別しない
        let Some(row) = row else {
            return Err(DirectoryError::InvalidCredentials);
        };

        let hashed = HashedSecret::from_phc_string(row.secret_hash)
            .map_err(|e| DirectoryError::Unavailable(format!("stored hash invalid: {e}")))?;
        let cleartext = ClearTextSecret::new(credentials.secret.as_str().to_string())
            .map_err(|_| DirectoryError::InvalidCredentials)?;

        if !hashed.verify(&cleartext) {
            return Err(DirectoryError::InvalidCredentials);
        }

        tracing::debug!(
            user_id = %DirectoryUserId::from_uuid(row.id),
            "Directory user verified"
        );

        Principal::from_provider_roles(credentials.identity.clone(), row.roles)
            .map_err(|e| DirectoryError::Unavailable(format!("role data invalid: {e}")))
    }
}

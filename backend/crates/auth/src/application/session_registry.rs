//! Session Registry
//!
//! 身元ごとに単一のアクティブセッションを保持する台帳。
//! 新しいログインは既存レコードを無条件に上書きし、前のセッションを
//! 事実上失効させる（single-active-session）。

use std::sync::Arc;

use chrono::Duration;
use platform::kv::SessionStore;
use uuid::Uuid;

use crate::domain::session_record::SessionRecord;
use crate::error::{AuthError, AuthResult};

fn session_key(identity: &str) -> String {
    format!("session:{identity}")
}

/// Single-active-session ledger backed by a key-value store
pub struct SessionRegistry<S> {
    store: Arc<S>,
    ttl: Duration,
}

impl<S: SessionStore + Sync> SessionRegistry<S> {
    /// `ttl` should match the token lifetime; records for expired tokens
    /// have no value.
    pub fn new(store: Arc<S>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Register `record` as the active session for its identity
    ///
    /// Unconditional overwrite: any previous session for the same identity
    /// is superseded. Concurrent logins race and the last write wins.
    pub async fn create_session(&self, record: &SessionRecord) -> AuthResult<()> {
        let value = serde_json::to_string(record)
            .map_err(|e| AuthError::Internal(format!("session record encoding failed: {e}")))?;
        let ttl = self.ttl.to_std().ok().filter(|d| !d.is_zero());
        self.store
            .set(&session_key(&record.identity), &value, ttl)
            .await?;
        Ok(())
    }

    /// Check whether `session_id` is still the active session for `identity`
    ///
    /// A single read; absent or unparsable records count as not active.
    pub async fn is_active_session(&self, identity: &str, session_id: Uuid) -> AuthResult<bool> {
        let Some(raw) = self.store.get(&session_key(identity)).await? else {
            return Ok(false);
        };
        let record: SessionRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(_) => return Ok(false),
        };
        Ok(record.session_id == session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credentials::Identity;
    use crate::domain::principal::Principal;
    use chrono::Utc;
    use platform::kv::MemoryStore;

    fn registry() -> SessionRegistry<MemoryStore> {
        SessionRegistry::new(Arc::new(MemoryStore::new()), Duration::minutes(30))
    }

    fn record_for(identity: &str) -> SessionRecord {
        let principal = Principal::from_provider_roles(
            Identity::parse(identity).unwrap(),
            vec!["viewer".into()],
        )
        .unwrap();
        SessionRecord::new(&principal, Utc::now())
    }

    #[tokio::test]
    async fn test_created_session_is_active() {
        let registry = registry();
        let record = record_for("user@x.com");
        registry.create_session(&record).await.unwrap();

        assert!(registry
            .is_active_session("user@x.com", record.session_id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_unknown_identity_is_not_active() {
        let registry = registry();
        assert!(!registry
            .is_active_session("ghost@x.com", Uuid::new_v4())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_new_login_supersedes_previous_session() {
        let registry = registry();
        let first = record_for("user@x.com");
        let second = record_for("user@x.com");

        registry.create_session(&first).await.unwrap();
        registry.create_session(&second).await.unwrap();

        assert!(!registry
            .is_active_session("user@x.com", first.session_id)
            .await
            .unwrap());
        assert!(registry
            .is_active_session("user@x.com", second.session_id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_identities_do_not_interfere() {
        let registry = registry();
        let a = record_for("alice@x.com");
        let b = record_for("bob@x.com");

        registry.create_session(&a).await.unwrap();
        registry.create_session(&b).await.unwrap();

        assert!(registry
            .is_active_session("alice@x.com", a.session_id)
            .await
            .unwrap());
        assert!(registry
            .is_active_session("bob@x.com", b.session_id)
            .await
            .unwrap());
    }
}

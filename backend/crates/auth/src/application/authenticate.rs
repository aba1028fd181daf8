//! Request Authentication
//!
//! 保護されたリクエストのゲート判定。トークン検証（署名・信頼・期限）を
//! 通過した後、レジストリ照合でセッションがまだ現役かを確認する。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::kv::SessionStore;

use crate::application::session_registry::SessionRegistry;
use crate::application::token::TokenService;
use crate::domain::principal::Principal;
use crate::error::{AuthError, AuthResult};

/// Verifies bearer tokens against the session registry
pub struct RequestAuthenticator<S> {
    tokens: Arc<TokenService>,
    registry: Arc<SessionRegistry<S>>,
}

impl<S: SessionStore + Sync> RequestAuthenticator<S> {
    pub fn new(tokens: Arc<TokenService>, registry: Arc<SessionRegistry<S>>) -> Self {
        Self { tokens, registry }
    }

    pub async fn authenticate(&self, token: &str) -> AuthResult<Principal> {
        self.authenticate_at(token, Utc::now()).await
    }

    /// Authenticate with an explicit clock (deterministic tests)
    pub async fn authenticate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Principal> {
        let verified = self.tokens.verify_at(token, now)?;

        let active = self
            .registry
            .is_active_session(verified.principal.identity().as_str(), verified.session_id)
            .await?;
        if !active {
            return Err(AuthError::SessionSuperseded);
        }

        Ok(verified.principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::AuthConfig;
    use crate::domain::credentials::Identity;
    use crate::domain::session_record::SessionRecord;
    use chrono::Duration;
    use platform::kv::MemoryStore;

    fn setup() -> (
        Arc<TokenService>,
        Arc<SessionRegistry<MemoryStore>>,
        RequestAuthenticator<MemoryStore>,
    ) {
        let config = AuthConfig::with_random_secret();
        let tokens = Arc::new(TokenService::new(&config));
        let registry = Arc::new(SessionRegistry::new(
            Arc::new(MemoryStore::new()),
            config.token_ttl,
        ));
        let authenticator = RequestAuthenticator::new(tokens.clone(), registry.clone());
        (tokens, registry, authenticator)
    }

    fn principal() -> Principal {
        Principal::from_provider_roles(
            Identity::parse("user@x.com").unwrap(),
            vec!["viewer".into()],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_with_active_session() {
        let (tokens, registry, authenticator) = setup();
        let principal = principal();
        let now = Utc::now();
        let record = SessionRecord::new(&principal, now);

        registry.create_session(&record).await.unwrap();
        let token = tokens.issue_at(&principal, &record, now).unwrap();

        let restored = authenticator.authenticate_at(&token, now).await.unwrap();
        assert_eq!(restored, principal);
    }

    #[tokio::test]
    async fn test_valid_token_without_registry_entry_is_superseded() {
        let (tokens, _registry, authenticator) = setup();
        let principal = principal();
        let now = Utc::now();
        let record = SessionRecord::new(&principal, now);

        // Token issued but session never registered (or already replaced)
        let token = tokens.issue_at(&principal, &record, now).unwrap();
        assert!(matches!(
            authenticator.authenticate_at(&token, now).await,
            Err(AuthError::SessionSuperseded)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_reported_before_registry_lookup() {
        let (tokens, registry, authenticator) = setup();
        let principal = principal();
        let now = Utc::now();
        let record = SessionRecord::new(&principal, now);

        registry.create_session(&record).await.unwrap();
        let token = tokens.issue_at(&principal, &record, now).unwrap();

        let later = now + Duration::hours(1);
        assert!(matches!(
            authenticator.authenticate_at(&token, later).await,
            Err(AuthError::TokenExpired)
        ));
    }
}

//! Login Use Case
//!
//! ログインフローの本体。固定順で実行する:
//! 1. Brute-force guard（ブロック中なら入力を見ずに 429）
//! 2. 構文検証（Credential Validator）
//! 3. ディレクトリ照合
//! 4. セッション登録（前セッションを上書き）
//! 5. トークン発行
//! 6. ガードのリセットと監査記録

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::client::ClientInfo;
use platform::kv::SessionStore;

use crate::application::guard::LoginGuard;
use crate::application::session_registry::SessionRegistry;
use crate::application::token::TokenService;
use crate::domain::credentials::Credentials;
use crate::domain::directory::{AuditEvent, AuditSink, CredentialDirectory, DirectoryError};
use crate::domain::principal::Principal;
use crate::domain::session_record::SessionRecord;
use crate::error::{AuthError, AuthResult};

/// Raw login input as received from the transport
#[derive(Debug)]
pub struct LoginInput {
    pub identity: String,
    pub secret: String,
}

/// Successful login result
#[derive(Debug)]
pub struct LoginOutput {
    pub token: String,
    pub principal: Principal,
    pub session: SessionRecord,
    pub token_expires_at: DateTime<Utc>,
}

/// Orchestrates one login attempt
pub struct LoginUseCase<D, S, A> {
    directory: Arc<D>,
    guard: Arc<LoginGuard<S>>,
    registry: Arc<SessionRegistry<S>>,
    tokens: Arc<TokenService>,
    audit: Arc<A>,
}

impl<D, S, A> LoginUseCase<D, S, A>
where
    D: CredentialDirectory + Sync,
    S: SessionStore + Sync,
    A: AuditSink + Sync,
{
    pub fn new(
        directory: Arc<D>,
        guard: Arc<LoginGuard<S>>,
        registry: Arc<SessionRegistry<S>>,
        tokens: Arc<TokenService>,
        audit: Arc<A>,
    ) -> Self {
        Self {
            directory,
            guard,
            registry,
            tokens,
            audit,
        }
    }

    pub async fn execute(
        &self,
        input: LoginInput,
        client: &ClientInfo,
        caller_key: &str,
    ) -> AuthResult<LoginOutput> {
        self.execute_at(input, client, caller_key, Utc::now()).await
    }

    /// Run the login flow with an explicit clock (deterministic tests)
    pub async fn execute_at(
        &self,
        input: LoginInput,
        client: &ClientInfo,
        caller_key: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<LoginOutput> {
        // ブロック判定が最優先。ブロック中の caller には構文エラーすら返さない
        if let Err(err) = self.guard.check(caller_key, now).await {
            if matches!(err, AuthError::AccountBlocked { .. }) {
                self.audit
                    .record(AuditEvent {
                        identity: input.identity.trim(),
                        client,
                        success: false,
                        detail: "blocked",
                    })
                    .await;
            }
            return Err(err);
        }

        // 構文検証の失敗はカウンタを進めない（400、401 ではないため）
        let credentials = Credentials::parse(&input.identity, &input.secret)?;

        let principal = match self.directory.authenticate(&credentials).await {
            Ok(principal) => principal,
            Err(DirectoryError::InvalidCredentials) => {
                self.guard.record_failure(caller_key, now).await?;
                self.audit
                    .record(AuditEvent {
                        identity: credentials.identity.as_str(),
                        client,
                        success: false,
                        detail: "invalid_credentials",
                    })
                    .await;
                return Err(AuthError::InvalidCredentials);
            }
            Err(DirectoryError::Unavailable(msg)) => {
                return Err(AuthError::Directory(msg));
            }
        };

        let session = SessionRecord::new(&principal, now);
        self.registry.create_session(&session).await?;

        let token = self.tokens.issue_at(&principal, &session, now)?;
        let token_expires_at = now + self.tokens.ttl();

        self.guard.reset(caller_key).await?;
        self.audit
            .record(AuditEvent {
                identity: principal.identity().as_str(),
                client,
                success: true,
                detail: "login",
            })
            .await;

        tracing::info!(
            identity = %principal.identity(),
            session_id = %session.session_id,
            active_role = %principal.active_role(),
            "Login succeeded"
        );

        Ok(LoginOutput {
            token,
            principal,
            session,
            token_expires_at,
        })
    }
}

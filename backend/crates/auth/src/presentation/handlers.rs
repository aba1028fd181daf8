//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use platform::client::extract_client_info;
use platform::cookie::extract_cookie;
use platform::crypto::random_token;
use platform::kv::SessionStore;

use crate::application::config::AuthConfig;
use crate::application::guard::LoginGuard;
use crate::application::login::{LoginInput, LoginUseCase};
use crate::application::session_registry::SessionRegistry;
use crate::application::token::TokenService;
use crate::domain::directory::{AuditSink, CredentialDirectory};
use crate::presentation::dto::{LoginRequest, LoginResponse};

/// Length of the transport-session cookie value (bytes of entropy)
const CALLER_TOKEN_BYTES: usize = 32;

/// Shared state for auth handlers
pub struct AuthAppState<D, S, A> {
    pub directory: Arc<D>,
    pub store: Arc<S>,
    pub audit: Arc<A>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<AuthConfig>,
}

// derive(Clone) would require D: Clone etc.; the Arcs are enough
impl<D, S, A> Clone for AuthAppState<D, S, A> {
    fn clone(&self) -> Self {
        Self {
            directory: self.directory.clone(),
            store: self.store.clone(),
            audit: self.audit.clone(),
            tokens: self.tokens.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<D, S, A>(
    State(state): State<AuthAppState<D, S, A>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<LoginRequest>,
) -> Response
where
    D: CredentialDirectory + Sync + Send + 'static,
    S: SessionStore + Sync + Send + 'static,
    A: AuditSink + Sync + Send + 'static,
{
    let client = extract_client_info(&headers, Some(addr.ip()));

    // 初回アクセスの caller には新しいトランスポートセッションを発行
    let caller_key = extract_cookie(&headers, &state.config.caller_cookie.name)
        .unwrap_or_else(|| random_token(CALLER_TOKEN_BYTES));

    let use_case = LoginUseCase::new(
        state.directory.clone(),
        Arc::new(LoginGuard::new(state.store.clone(), &state.config)),
        Arc::new(SessionRegistry::new(
            state.store.clone(),
            state.config.token_ttl,
        )),
        state.tokens.clone(),
        state.audit.clone(),
    );

    let input = LoginInput {
        identity: req.identity,
        secret: req.secret,
    };

    match use_case.execute(input, &client, &caller_key).await {
        Ok(output) => {
            // 成功時はトランスポートセッションをローテーション
            let fresh = random_token(CALLER_TOKEN_BYTES);
            (
                StatusCode::OK,
                [(header::SET_COOKIE, state.config.caller_cookie.set(&fresh))],
                Json(LoginResponse {
                    identity: output.principal.identity().as_str().to_string(),
                    roles: output.principal.roles().iter().cloned().collect(),
                    active_role: output.principal.active_role().to_string(),
                    token: output.token,
                    token_expires_at_ms: output.token_expires_at.timestamp_millis(),
                }),
            )
                .into_response()
        }
        Err(err) => {
            // 失敗時は同じ caller cookie を維持し、連続失敗を同一キーで数える
            let cookie = state.config.caller_cookie.set_header(&caller_key);
            let mut response = err.into_response();
            response.headers_mut().insert(header::SET_COOKIE, cookie);
            response
        }
    }
}

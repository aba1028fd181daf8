//! Auth Router

use axum::{Router, routing::post};
use std::sync::Arc;

use platform::kv::SessionStore;

use crate::application::config::AuthConfig;
use crate::application::token::TokenService;
use crate::domain::directory::{AuditSink, CredentialDirectory};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::GateState;

/// Create the auth router for any directory/store/audit combination
pub fn auth_router<D, S, A>(
    directory: Arc<D>,
    store: Arc<S>,
    audit: Arc<A>,
    config: AuthConfig,
) -> Router
where
    D: CredentialDirectory + Sync + Send + 'static,
    S: SessionStore + Sync + Send + 'static,
    A: AuditSink + Sync + Send + 'static,
{
    let config = Arc::new(config);
    let state = AuthAppState {
        directory,
        store,
        audit,
        tokens: Arc::new(TokenService::new(&config)),
        config,
    };

    Router::new()
        .route("/login", post(handlers::login::<D, S, A>))
        .with_state(state)
}

/// Build the gate state protecting non-auth routes
///
/// Must share `store` and `config` with [`auth_router`] so gate checks see
/// the sessions logins create.
pub fn gate_state<S>(store: Arc<S>, config: &AuthConfig) -> GateState<S>
where
    S: SessionStore + Sync + Send + 'static,
{
    GateState {
        tokens: Arc::new(TokenService::new(config)),
        store,
        session_ttl: config.token_ttl,
    }
}

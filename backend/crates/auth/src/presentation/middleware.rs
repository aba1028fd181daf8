//! Request Gate Middleware
//!
//! Middleware for requiring a valid bearer token on protected routes.

use axum::body::Body;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use platform::kv::SessionStore;

use crate::application::authenticate::RequestAuthenticator;
use crate::application::session_registry::SessionRegistry;
use crate::application::token::TokenService;
use crate::domain::principal::Principal;
use crate::error::AuthError;

/// Middleware state
pub struct GateState<S> {
    pub tokens: Arc<TokenService>,
    pub store: Arc<S>,
    pub session_ttl: chrono::Duration,
}

impl<S> Clone for GateState<S> {
    fn clone(&self) -> Self {
        Self {
            tokens: self.tokens.clone(),
            store: self.store.clone(),
            session_ttl: self.session_ttl,
        }
    }
}

/// Authenticated principal stored in request extensions
#[derive(Clone)]
pub struct AuthContext {
    pub principal: Principal,
}

/// Extract the bearer token from the Authorization header
fn extract_bearer(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Middleware that requires a live, non-superseded session token
///
/// On success the verified [`AuthContext`] is inserted into request
/// extensions for downstream handlers.
pub async fn require_bearer<S>(
    state: GateState<S>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    S: SessionStore + Sync + Send + 'static,
{
    let Some(token) = extract_bearer(&req) else {
        return Err(AuthError::TokenMissing.into_response());
    };
    let token = token.to_string();

    let authenticator = RequestAuthenticator::new(
        state.tokens.clone(),
        Arc::new(SessionRegistry::new(state.store.clone(), state.session_ttl)),
    );

    let principal = match authenticator.authenticate(&token).await {
        Ok(principal) => principal,
        Err(err) => return Err(err.into_response()),
    };

    req.extensions_mut().insert(AuthContext { principal });
    Ok(next.run(req).await)
}

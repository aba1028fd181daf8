//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use auth::{AnyDirectory, AuthConfig, PgDirectory, RestDirectory, TracingAuditSink};
use auth::middleware::{AuthContext, require_bearer};
use axum::{
    Extension, Json, Router, http,
    http::{Method, header},
    routing::get,
};
use base64::Engine;
use base64::engine::general_purpose;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[cfg(not(feature = "redis"))]
type Store = platform::kv::MemoryStore;
#[cfg(feature = "redis")]
type Store = platform::kv::RedisStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_auth_config()?;
    let directory = Arc::new(build_directory().await?);
    let store = Arc::new(build_store().await?);
    let audit = Arc::new(TracingAuditSink);

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Gate for routes that require a live session
    let gate = auth::gate_state(store.clone(), &config);
    let protected = Router::new()
        .route("/api/onboarding/profile", get(profile))
        .layer(axum::middleware::from_fn(move |req, next| {
            let gate = gate.clone();
            async move { require_bearer::<Store>(gate, req, next).await }
        }));

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth::auth_router(directory, store, audit, config))
        .merge(protected)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(31113);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Load the auth configuration from the environment
///
/// Debug builds fall back to a random per-process secret; production must
/// configure `AUTH_TOKEN_SECRET` (base64, 32 bytes) so tokens survive
/// restarts and multiple instances agree.
fn load_auth_config() -> anyhow::Result<AuthConfig> {
    if cfg!(debug_assertions) && env::var("AUTH_TOKEN_SECRET").is_err() {
        return Ok(AuthConfig::development());
    }

    let secret_b64 =
        env::var("AUTH_TOKEN_SECRET").expect("AUTH_TOKEN_SECRET must be set in production");
    let token_secret = Engine::decode(&general_purpose::STANDARD, &secret_b64)?;
    anyhow::ensure!(
        token_secret.len() >= 32,
        "AUTH_TOKEN_SECRET must decode to at least 32 bytes"
    );

    Ok(AuthConfig {
        token_secret,
        ..AuthConfig::default()
    })
}

/// Select the credential directory backend
///
/// `AUTH_DIRECTORY=rest` forwards to an external provider at
/// `DIRECTORY_URL`; anything else uses the local Postgres directory.
async fn build_directory() -> anyhow::Result<AnyDirectory> {
    match env::var("AUTH_DIRECTORY").as_deref() {
        Ok("rest") => {
            let base_url =
                env::var("DIRECTORY_URL").expect("DIRECTORY_URL must be set for the REST directory");
            tracing::info!(base_url = %base_url, "Using REST credential directory");
            Ok(AnyDirectory::Rest(RestDirectory::new(
                reqwest::Client::new(),
                base_url,
            )))
        }
        _ => {
            let database_url =
                env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;
            tracing::info!("Using Postgres credential directory");
            Ok(AnyDirectory::Postgres(PgDirectory::new(pool)))
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn build_store() -> anyhow::Result<Store> {
    tracing::info!("Using in-memory session store");
    Ok(platform::kv::MemoryStore::new())
}

#[cfg(feature = "redis")]
async fn build_store() -> anyhow::Result<Store> {
    let url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
    tracing::info!("Using Redis session store");
    Ok(platform::kv::RedisStore::connect(&url).await?)
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/onboarding/profile
///
/// Minimal protected resource; echoes the authenticated principal.
async fn profile(Extension(context): Extension<AuthContext>) -> Json<serde_json::Value> {
    let principal = &context.principal;
    Json(json!({
        "identity": principal.identity().as_str(),
        "roles": principal.roles().iter().collect::<Vec<_>>(),
        "activeRole": principal.active_role(),
    }))
}

//! Auth Configuration

use chrono::Duration;
use platform::cookie::CookieConfig;
use rand::RngCore;

/// Authentication subsystem configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 signing key for bearer tokens
    pub token_secret: Vec<u8>,

    /// Bearer token lifetime
    pub token_ttl: Duration,

    /// Expected `iss` claim
    pub issuer: String,

    /// Expected `aud` claim
    pub audience: String,

    /// Consecutive failures before a caller is blocked
    pub max_attempts: u32,

    /// How long a blocked caller stays blocked
    pub block_duration: Duration,

    /// Transport cookie identifying the caller session
    pub caller_cookie: CookieConfig,

    /// Retention of per-caller attempt state in the store
    pub caller_state_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: Vec::new(),
            token_ttl: Duration::minutes(30),
            issuer: "onboarding-api".to_string(),
            audience: "onboarding-clients".to_string(),
            max_attempts: 3,
            block_duration: Duration::seconds(60),
            caller_cookie: CookieConfig::default(),
            // ブロック期間より十分長く保持する
            caller_state_ttl: Duration::seconds(60) + Duration::hours(1),
        }
    }
}

impl AuthConfig {
    /// Generate a random 256-bit signing secret
    ///
    /// Tokens do not survive process restarts with this; production
    /// deployments must configure a stable secret instead.
    pub fn with_random_secret() -> Self {
        let mut secret = vec![0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            token_secret: secret,
            ..Self::default()
        }
    }

    /// Development configuration (relaxed cookie security, random secret)
    pub fn development() -> Self {
        let mut config = Self::with_random_secret();
        config.caller_cookie.secure = false;
        config
    }
}

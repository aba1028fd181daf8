//! Brute-Force Guard
//!
//! caller session（トランスポート cookie）単位の失敗カウンタ。
//! 鍵は cookie 値の SHA-256 ハッシュで、生の cookie 値はストアに
//! 書き込まない。

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use platform::crypto;
use platform::kv::SessionStore;

use crate::application::config::AuthConfig;
use crate::domain::login_attempts::{AttemptStatus, LoginAttemptState};
use crate::error::{AuthError, AuthResult};

fn attempt_key(caller_key: &str) -> String {
    format!(
        "login_attempts:{}",
        crypto::to_base64(&crypto::sha256(caller_key.as_bytes()))
    )
}

/// Per-caller login throttle
pub struct LoginGuard<S> {
    store: Arc<S>,
    max_attempts: u32,
    block_duration: Duration,
    state_ttl: Duration,
}

impl<S: SessionStore + Sync> LoginGuard<S> {
    pub fn new(store: Arc<S>, config: &AuthConfig) -> Self {
        Self {
            store,
            max_attempts: config.max_attempts,
            block_duration: config.block_duration,
            state_ttl: config.caller_state_ttl,
        }
    }

    async fn load(&self, caller_key: &str) -> AuthResult<LoginAttemptState> {
        let Some(raw) = self.store.get(&attempt_key(caller_key)).await? else {
            return Ok(LoginAttemptState::default());
        };
        // 壊れた状態はカウンタゼロ扱い（呼び出し側に有利な方へ倒す）
        Ok(serde_json::from_str(&raw).unwrap_or_default())
    }

    async fn save(&self, caller_key: &str, state: &LoginAttemptState) -> AuthResult<()> {
        let value = serde_json::to_string(state)
            .map_err(|e| AuthError::Internal(format!("attempt state encoding failed: {e}")))?;
        let ttl = self.state_ttl.to_std().ok();
        self.store.set(&attempt_key(caller_key), &value, ttl).await?;
        Ok(())
    }

    /// Gate a login attempt; errors with `AccountBlocked` while blocked
    ///
    /// Runs before credential validation so blocked callers learn nothing
    /// about their input. An elapsed block is cleared here, giving the
    /// caller a fresh counter.
    pub async fn check(&self, caller_key: &str, now: DateTime<Utc>) -> AuthResult<()> {
        let mut state = self.load(caller_key).await?;

        if state.reopen_if_elapsed(now) {
            self.save(caller_key, &state).await?;
        }

        match state.status(now) {
            AttemptStatus::Open => Ok(()),
            AttemptStatus::Blocked { until } => Err(AuthError::AccountBlocked {
                retry_after_secs: (until - now).num_seconds().max(1),
            }),
        }
    }

    /// Record one rejected-credentials failure for this caller
    pub async fn record_failure(&self, caller_key: &str, now: DateTime<Utc>) -> AuthResult<()> {
        let mut state = self.load(caller_key).await?;
        state.record_failure(now, self.max_attempts, self.block_duration);
        self.save(caller_key, &state).await
    }

    /// Clear the caller's failure history after a successful login
    pub async fn reset(&self, caller_key: &str) -> AuthResult<()> {
        self.store.delete(&attempt_key(caller_key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::kv::MemoryStore;

    fn guard() -> LoginGuard<MemoryStore> {
        LoginGuard::new(Arc::new(MemoryStore::new()), &AuthConfig::default())
    }

    #[tokio::test]
    async fn test_open_below_threshold() {
        let guard = guard();
        let now = Utc::now();

        guard.record_failure("caller-1", now).await.unwrap();
        guard.record_failure("caller-1", now).await.unwrap();
        assert!(guard.check("caller-1", now).await.is_ok());
    }

    #[tokio::test]
    async fn test_blocked_at_threshold_with_retry_hint() {
        let guard = guard();
        let now = Utc::now();
        for _ in 0..3 {
            guard.record_failure("caller-1", now).await.unwrap();
        }

        let err = guard
            .check("caller-1", now + Duration::seconds(1))
            .await
            .unwrap_err();
        match err {
            AuthError::AccountBlocked { retry_after_secs } => {
                assert_eq!(retry_after_secs, 59);
            }
            other => panic!("expected AccountBlocked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_elapsed_block_reopens_with_clean_counter() {
        let guard = guard();
        let now = Utc::now();
        for _ in 0..3 {
            guard.record_failure("caller-1", now).await.unwrap();
        }

        let after = now + Duration::seconds(61);
        assert!(guard.check("caller-1", after).await.is_ok());

        // One more failure does not immediately re-block
        guard.record_failure("caller-1", after).await.unwrap();
        assert!(guard.check("caller-1", after).await.is_ok());
    }

    #[tokio::test]
    async fn test_callers_are_isolated() {
        let guard = guard();
        let now = Utc::now();
        for _ in 0..3 {
            guard.record_failure("caller-1", now).await.unwrap();
        }

        assert!(guard.check("caller-2", now).await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_clears_history() {
        let guard = guard();
        let now = Utc::now();
        guard.record_failure("caller-1", now).await.unwrap();
        guard.record_failure("caller-1", now).await.unwrap();

        guard.reset("caller-1").await.unwrap();

        // Two more failures only reach a count of two
        guard.record_failure("caller-1", now).await.unwrap();
        guard.record_failure("caller-1", now).await.unwrap();
        assert!(guard.check("caller-1", now).await.is_ok());
    }
}

//! Login Attempt State
//!
//! ブルートフォース対策の状態機械。caller session 単位で連続失敗を数え、
//! 閾値到達でブロック期間に入る。
//!
//! 状態遷移:
//! - Open --(失敗 x max_attempts)--> Blocked(until)
//! - Blocked --(until 経過後の次回アクセス)--> Open (attempts = 0)
//! - Open --(成功)--> Open (attempts = 0)

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Per-caller failure counter and block window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttemptState {
    /// Consecutive failed attempts since the last reset
    pub attempts: u32,

    /// End of the current block window, when blocked
    pub blocked_until: Option<DateTime<Utc>>,
}

/// Current guard decision for a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    /// Login attempts may proceed
    Open,
    /// Logins are refused until the given instant
    Blocked { until: DateTime<Utc> },
}

impl LoginAttemptState {
    /// Evaluate the state at `now`
    ///
    /// Read-only; an elapsed block still reports `Open` here and is
    /// reset separately via [`reopen_if_elapsed`](Self::reopen_if_elapsed).
    pub fn status(&self, now: DateTime<Utc>) -> AttemptStatus {
        match self.blocked_until {
            Some(until) if now < until => AttemptStatus::Blocked { until },
            _ => AttemptStatus::Open,
        }
    }

    /// Clear an elapsed block, returning whether anything changed
    ///
    /// The caller gets a clean slate: the attempt counter restarts at zero.
    pub fn reopen_if_elapsed(&mut self, now: DateTime<Utc>) -> bool {
        match self.blocked_until {
            Some(until) if now >= until => {
                self.attempts = 0;
                self.blocked_until = None;
                true
            }
            _ => false,
        }
    }

    /// Record one failed attempt; enter the blocked state at the threshold
    pub fn record_failure(
        &mut self,
        now: DateTime<Utc>,
        max_attempts: u32,
        block_duration: Duration,
    ) {
        self.attempts = self.attempts.saturating_add(1);
        if self.attempts >= max_attempts {
            self.blocked_until = Some(now + block_duration);
        }
    }

    /// Record a successful login, clearing the failure history
    pub fn record_success(&mut self) {
        self.attempts = 0;
        self.blocked_until = None;
    }
}

//! Session Record
//!
//! 身元ごとに一件だけ保持されるアクティブセッションの台帳エントリ。

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::principal::Principal;

/// The single active session for one identity
///
/// Stored in the session registry keyed by identity; a new login for the
/// same identity overwrites this record, invalidating the previous token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Owning identity
    pub identity: String,

    /// Unique session identifier, embedded in the token as `jti`
    pub session_id: Uuid,

    /// Roles granted at login time
    pub role_snapshot: BTreeSet<String>,

    /// When the session was established
    pub issued_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Start a fresh session for a freshly authenticated principal
    pub fn new(principal: &Principal, issued_at: DateTime<Utc>) -> Self {
        Self {
            identity: principal.identity().as_str().to_string(),
            session_id: Uuid::new_v4(),
            role_snapshot: principal.roles().clone(),
            issued_at,
        }
    }
}

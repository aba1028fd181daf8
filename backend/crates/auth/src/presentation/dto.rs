//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

// ============================================================================
// Login
// ============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub identity: String,
    pub secret: String,
}

/// Login response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub identity: String,
    pub roles: Vec<String>,
    pub active_role: String,
    /// Signed bearer token for subsequent requests
    pub token: String,
    pub token_expires_at_ms: i64,
}

//! Token Service
//!
//! HMAC-SHA256 署名付きベアラートークンの発行と検証。
//!
//! 検証の失敗分類は固定順で評価する:
//! 1. 構文・署名（パース不能 → Malformed、署名不一致 → SignatureInvalid）
//! 2. 発行者 / 受信者クレーム（不一致 → SignatureInvalid）
//! 3. 有効期限（経過 → Expired）
//!
//! 複数の欠陥を持つトークンは最初に検出された欠陥のみ報告される。

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::credentials::Identity;
use crate::domain::principal::Principal;
use crate::domain::session_record::SessionRecord;
use crate::error::{AuthError, AuthResult};

/// Bearer token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity of the authenticated user
    pub sub: String,
    /// All granted roles
    pub roles: Vec<String>,
    /// Role in effect for this session
    pub active_role: String,
    /// Session identifier (matches the registry record)
    pub jti: Uuid,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

/// A token that passed signature, trust and expiry checks
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub principal: Principal,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies signed bearer tokens
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&config.token_secret),
            decoding_key: DecodingKey::from_secret(&config.token_secret),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: config.token_ttl,
        }
    }

    /// Issue a token for a freshly established session
    pub fn issue(&self, principal: &Principal, session: &SessionRecord) -> AuthResult<String> {
        self.issue_at(principal, session, Utc::now())
    }

    /// Issue a token with an explicit clock (deterministic tests)
    pub fn issue_at(
        &self,
        principal: &Principal,
        session: &SessionRecord,
        now: DateTime<Utc>,
    ) -> AuthResult<String> {
        let claims = Claims {
            sub: principal.identity().as_str().to_string(),
            roles: principal.roles().iter().cloned().collect(),
            active_role: principal.active_role().to_string(),
            jti: session.session_id,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("token encoding failed: {e}")))
    }

    /// Verify a raw token string
    pub fn verify(&self, token: &str) -> AuthResult<VerifiedToken> {
        self.verify_at(token, Utc::now())
    }

    /// Verify with an explicit clock (deterministic tests)
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<VerifiedToken> {
        // 署名と構文のみここで確認し、クレーム検証は下で順序どおり行う
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| classify_decode_error(e.kind()))?;
        let claims = data.claims;

        if claims.iss != self.issuer || claims.aud != self.audience {
            return Err(AuthError::TokenSignatureInvalid);
        }

        if now.timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }

        let identity = Identity::parse(&claims.sub).map_err(|_| AuthError::TokenMalformed)?;
        let roles: BTreeSet<String> = claims.roles.into_iter().collect();
        let principal = Principal::restore(identity, roles, claims.active_role)
            .map_err(|_| AuthError::TokenMalformed)?;

        Ok(VerifiedToken {
            principal,
            session_id: claims.jti,
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(now),
        })
    }

    /// Token lifetime, for reporting expiry alongside issued tokens
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

fn classify_decode_error(kind: &JwtErrorKind) -> AuthError {
    match kind {
        JwtErrorKind::InvalidSignature
        | JwtErrorKind::InvalidAlgorithm
        | JwtErrorKind::InvalidAlgorithmName => AuthError::TokenSignatureInvalid,
        JwtErrorKind::InvalidToken
        | JwtErrorKind::Base64(_)
        | JwtErrorKind::Json(_)
        | JwtErrorKind::Utf8(_) => AuthError::TokenMalformed,
        _ => AuthError::TokenMalformed,
    }
}

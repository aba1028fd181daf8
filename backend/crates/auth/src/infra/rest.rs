//! REST Credential Directory
//!
//! テナントが外部の認証プロバイダを使う構成向け。`POST {base}/authenticate`
//! に資格情報を転送し、200 のボディから principal を組み立てる。

use serde::{Deserialize, Serialize};

use crate::domain::credentials::Credentials;
use crate::domain::directory::{CredentialDirectory, DirectoryError};
use crate::domain::principal::Principal;

#[derive(Serialize)]
struct AuthenticateRequest<'a> {
    identity: &'a str,
    secret: &'a str,
}

#[derive(Deserialize)]
struct AuthenticateResponse {
    identity: String,
    roles: Vec<String>,
}

/// Credential directory speaking to an external HTTP provider
pub struct RestDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl RestDirectory {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }
}

impl CredentialDirectory for RestDirectory {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Principal, DirectoryError> {
        let response = self
            .client
            .post(format!("{}/authenticate", self.base_url))
            .json(&AuthenticateRequest {
                identity: credentials.identity.as_str(),
                secret: credentials.secret.as_str(),
            })
            .send()
            .await
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;

        match response.status().as_u16() {
            200 => {
                let body: AuthenticateResponse = response
                    .json()
                    .await
                    .map_err(|e| DirectoryError::Unavailable(format!("bad provider body: {e}")))?;

                // プロバイダ応答の identity も同じ構文規則に通す
                let identity = crate::domain::credentials::Identity::parse(&body.identity)
                    .map_err(|e| {
                        DirectoryError::Unavailable(format!("provider identity invalid: {e}"))
                    })?;
                Principal::from_provider_roles(identity, body.roles)
                    .map_err(|e| DirectoryError::Unavailable(format!("role data invalid: {e}")))
            }
            401 => Err(DirectoryError::InvalidCredentials),
            status => Err(DirectoryError::Unavailable(format!(
                "provider returned status {status}"
            ))),
        }
    }
}

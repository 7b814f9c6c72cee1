use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::errors::{Result, TokenizerError};

/// Source of fresh bearer credentials.
///
/// Implementations talk to the identity endpoint directly; they must not go
/// through the session they are feeding.
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    /// Obtain a new bearer token. Failures are reported as `TokenizerError::Auth`.
    async fn exchange(&self) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// OAuth2 client-credentials grant against `{base}/oidc/token`.
pub struct ClientCredentials {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: zeroize::Zeroizing<String>,
}

impl ClientCredentials {
    pub fn new(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            http,
            token_url: config.endpoint("/oidc/token"),
            client_id: config.client_id.clone(),
            client_secret: zeroize::Zeroizing::new(config.client_secret().to_string()),
        }
    }
}

#[async_trait]
impl CredentialExchange for ClientCredentials {
    async fn exchange(&self) -> Result<String> {
        tracing::debug!(url = %self.token_url, client_id = %self.client_id, "Requesting access token");

        let resp = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(self.client_secret.as_str()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| TokenizerError::auth(format!("token request failed: {}", e)))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| TokenizerError::auth(format!("failed to read token response: {}", e)))?;

        if !status.is_success() {
            let err = TokenizerError::from_response(status.as_u16(), &body).into_auth();
            tracing::warn!(
                status = status.as_u16(),
                request_id = err.request_id().unwrap_or("-"),
                "Credential exchange rejected"
            );
            return Err(err);
        }

        let parsed: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| TokenizerError::auth(format!("invalid token response: {}", e)))?;

        parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TokenizerError::auth("token response missing access_token"))
    }
}

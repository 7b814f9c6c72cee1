//! Authenticated JSON request execution against the tokenizer API.
//!
//! Every call takes the session's current bearer token, sends one request and
//! either decodes the success body or maps the failure into a typed error.
//! Connection-level retries are opt-in and never apply to create calls unless
//! explicitly enabled.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{RetryTransientMiddleware, Retryable, RetryableStrategy};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::{AuthSession, BearerToken, ClientCredentials, CredentialExchange};
use crate::config::ClientConfig;
use crate::errors::{ApiFailure, ErrorKind, Result, TokenizerError};

/// Whether replaying a request could create a duplicate resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    Idempotent,
    NonIdempotent,
}

/// Retry only when the connection could not be established.
///
/// A timed-out or reset request may already have been applied, so it is not
/// replayed. Status codes are the caller's business: a 503 surfaces as `Server`.
struct ConnectionFailuresOnly;

impl RetryableStrategy for ConnectionFailuresOnly {
    fn handle(
        &self,
        res: &std::result::Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Err(reqwest_middleware::Error::Reqwest(e)) if e.is_connect() => Some(Retryable::Transient),
            _ => None,
        }
    }
}

pub struct RequestExecutor {
    config: ClientConfig,
    session: AuthSession,
    retrying: ClientWithMiddleware,
    single_shot: ClientWithMiddleware,
}

impl RequestExecutor {
    /// Executor whose session uses the client-credentials grant.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        let exchange = ClientCredentials::new(http.clone(), &config);
        Self::from_parts(config, http, Box::new(exchange))
    }

    /// Executor with a custom credential source.
    pub fn with_exchange(config: ClientConfig, exchange: Box<dyn CredentialExchange>) -> Result<Self> {
        let http = build_http_client(&config)?;
        Self::from_parts(config, http, exchange)
    }

    fn from_parts(
        config: ClientConfig,
        http: reqwest::Client,
        exchange: Box<dyn CredentialExchange>,
    ) -> Result<Self> {
        let single_shot = ClientBuilder::new(http.clone()).build();
        let retrying = if config.network_retries > 0 {
            let policy = ExponentialBackoff::builder().build_with_max_retries(config.network_retries);
            ClientBuilder::new(http)
                .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                    policy,
                    ConnectionFailuresOnly,
                ))
                .build()
        } else {
            single_shot.clone()
        };

        let session = AuthSession::new(exchange, config.refresh_leeway);

        Ok(Self {
            config,
            session,
            retrying,
            single_shot,
        })
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn client_for(&self, idempotency: Idempotency) -> &ClientWithMiddleware {
        match idempotency {
            Idempotency::Idempotent => &self.retrying,
            Idempotency::NonIdempotent if self.config.retry_non_idempotent => &self.retrying,
            Idempotency::NonIdempotent => &self.single_shot,
        }
    }

    /// Send one authenticated request and return the raw success body.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        idempotency: Idempotency,
    ) -> Result<(StatusCode, Bytes)> {
        let token = self.session.current_token().await?;
        let url = self.config.endpoint(path);

        let mut req = self
            .client_for(idempotency)
            .request(method.clone(), &url)
            .bearer_auth(token.as_str());

        if let Some(body) = body {
            let encoded = serde_json::to_vec(body).map_err(|e| {
                TokenizerError::transport(format!("failed to encode request body: {}", e))
            })?;
            req = req.header(CONTENT_TYPE, "application/json").body(encoded);
        }

        let resp = req.send().await.map_err(|e| {
            warn!(method = %method, path = %path, "Tokenizer request failed: {}", e);
            TokenizerError::from(e)
        })?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        debug!(method = %method, path = %path, status = status.as_u16(), "Tokenizer request");

        if status.is_success() {
            return Ok((status, bytes));
        }

        let err = TokenizerError::from_response(status.as_u16(), &bytes);
        self.on_failure(&method, path, &token, &err).await;
        Err(err)
    }

    async fn on_failure(&self, method: &Method, path: &str, token: &BearerToken, err: &TokenizerError) {
        if err.kind() == ErrorKind::Auth {
            self.session.invalidate(token).await;
        }
        warn!(
            method = %method,
            path = %path,
            status = err.status().unwrap_or_default(),
            kind = %err.kind(),
            request_id = err.request_id().unwrap_or("-"),
            "Tokenizer request rejected: {}",
            err.message()
        );
    }

    /// Send a request and decode its JSON success body.
    pub async fn execute<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        idempotency: Idempotency,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let (status, bytes) = self.send(method, path, body, idempotency).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            TokenizerError::Transport(ApiFailure {
                status: Some(status.as_u16()),
                message: format!("failed to decode response body: {}", e),
                request_id: None,
            })
        })
    }

    /// Send a request whose success carries no body.
    ///
    /// Returns `true` only for 204 No Content.
    pub async fn execute_no_content<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        idempotency: Idempotency,
    ) -> Result<bool>
    where
        B: Serialize + ?Sized,
    {
        let (status, _) = self.send(method, path, body, idempotency).await?;
        Ok(status == StatusCode::NO_CONTENT)
    }
}

/// Run `fut` under `deadline`, surfacing expiry as a transport error.
pub(crate) async fn within<T>(deadline: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(TokenizerError::transport(format!(
            "deadline of {:?} exceeded",
            deadline
        ))),
    }
}

/// No client-wide total timeout: each call is bounded by its handle's deadline.
fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .use_rustls_tls()
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|e| TokenizerError::transport(format!("failed to build HTTP client: {}", e)))
}

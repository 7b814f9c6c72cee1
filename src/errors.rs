use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Raw body prefix kept in the message when an error body is not `{error, request_id}`.
const RAW_BODY_PREVIEW: usize = 200;

/// Coarse classification of every failure the client can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Auth,
    Validation,
    NotFound,
    Conflict,
    Server,
    Transport,
}

impl ErrorKind {
    /// Total mapping from an HTTP status to an error kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::Validation,
            401 | 403 => ErrorKind::Auth,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Transport,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Auth => "auth",
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Server => "server",
            ErrorKind::Transport => "transport",
        };
        f.write_str(s)
    }
}

/// Diagnostic payload shared by every error variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    /// HTTP status, absent when the failure never reached HTTP semantics.
    pub status: Option<u16>,
    pub message: String,
    /// Server-side correlation id from the error body.
    pub request_id: Option<String>,
}

impl ApiFailure {
    pub fn local(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            request_id: None,
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(status) = self.status {
            write!(f, " (status {})", status)?;
        }
        if let Some(id) = &self.request_id {
            write!(f, " [request_id {}]", id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum TokenizerError {
    #[error("authentication failed: {0}")]
    Auth(ApiFailure),

    #[error("invalid request: {0}")]
    Validation(ApiFailure),

    #[error("not found: {0}")]
    NotFound(ApiFailure),

    #[error("conflict: {0}")]
    Conflict(ApiFailure),

    #[error("server error: {0}")]
    Server(ApiFailure),

    #[error("transport error: {0}")]
    Transport(ApiFailure),
}

/// Error body returned by the service for any status >= 400.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    request_id: Option<String>,
}

impl TokenizerError {
    pub fn new(kind: ErrorKind, failure: ApiFailure) -> Self {
        match kind {
            ErrorKind::Auth => TokenizerError::Auth(failure),
            ErrorKind::Validation => TokenizerError::Validation(failure),
            ErrorKind::NotFound => TokenizerError::NotFound(failure),
            ErrorKind::Conflict => TokenizerError::Conflict(failure),
            ErrorKind::Server => TokenizerError::Server(failure),
            ErrorKind::Transport => TokenizerError::Transport(failure),
        }
    }

    /// Build the typed error for a non-success response.
    ///
    /// The kind always comes from the status. A body that does not match the
    /// `{error, request_id}` schema only degrades the message.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let failure = match serde_json::from_slice::<ErrorBody>(body) {
            Ok(b) => ApiFailure {
                status: Some(status),
                message: if b.error.is_empty() {
                    format!("unexpected status {}", status)
                } else {
                    b.error
                },
                request_id: b.request_id.filter(|id| !id.is_empty()),
            },
            Err(_) => {
                let text = String::from_utf8_lossy(body);
                let message = if text.trim().is_empty() {
                    format!("unexpected status {}", status)
                } else {
                    text.chars().take(RAW_BODY_PREVIEW).collect()
                };
                ApiFailure {
                    status: Some(status),
                    message,
                    request_id: None,
                }
            }
        };
        Self::new(ErrorKind::from_status(status), failure)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        TokenizerError::Validation(ApiFailure::local(message))
    }

    pub fn transport(message: impl Into<String>) -> Self {
        TokenizerError::Transport(ApiFailure::local(message))
    }

    pub fn auth(message: impl Into<String>) -> Self {
        TokenizerError::Auth(ApiFailure::local(message))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TokenizerError::Auth(_) => ErrorKind::Auth,
            TokenizerError::Validation(_) => ErrorKind::Validation,
            TokenizerError::NotFound(_) => ErrorKind::NotFound,
            TokenizerError::Conflict(_) => ErrorKind::Conflict,
            TokenizerError::Server(_) => ErrorKind::Server,
            TokenizerError::Transport(_) => ErrorKind::Transport,
        }
    }

    pub fn failure(&self) -> &ApiFailure {
        match self {
            TokenizerError::Auth(f)
            | TokenizerError::Validation(f)
            | TokenizerError::NotFound(f)
            | TokenizerError::Conflict(f)
            | TokenizerError::Server(f)
            | TokenizerError::Transport(f) => f,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.failure().status
    }

    pub fn message(&self) -> &str {
        &self.failure().message
    }

    pub fn request_id(&self) -> Option<&str> {
        self.failure().request_id.as_deref()
    }

    /// Re-tag a failure as an authentication failure, keeping its diagnostics.
    pub(crate) fn into_auth(self) -> Self {
        match self {
            TokenizerError::Auth(f) => TokenizerError::Auth(f),
            other => TokenizerError::Auth(other.failure().clone()),
        }
    }
}

impl From<reqwest::Error> for TokenizerError {
    fn from(e: reqwest::Error) -> Self {
        TokenizerError::transport(e.to_string())
    }
}

impl From<reqwest_middleware::Error> for TokenizerError {
    fn from(e: reqwest_middleware::Error) -> Self {
        TokenizerError::transport(e.to_string())
    }
}

pub type Result<T, E = TokenizerError> = std::result::Result<T, E>;

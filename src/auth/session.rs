use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::claims::unverified_expiry;
use super::exchange::CredentialExchange;
use crate::errors::{Result, TokenizerError};

/// A bearer credential. Cheap to clone; never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(Arc<str>);

impl BearerToken {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Token plus its decoded expiry, always replaced together.
struct HeldToken {
    bearer: BearerToken,
    expires_at: Option<DateTime<Utc>>,
}

impl HeldToken {
    fn new(raw: String) -> Self {
        let expires_at = unverified_expiry(&raw);
        Self {
            bearer: BearerToken::new(raw),
            expires_at,
        }
    }

    /// Tokens without a readable `exp` are kept until the server rejects them.
    fn is_expired(&self, now: DateTime<Utc>, leeway: chrono::Duration) -> bool {
        match self.expires_at {
            Some(exp) => now + leeway >= exp,
            None => false,
        }
    }
}

/// Outcome of the most recent exchange, guarded by the session lock.
#[derive(Default)]
struct SessionState {
    held: Option<HeldToken>,
    /// Set when the latest exchange failed; cleared by the next success.
    last_failure: Option<TokenizerError>,
}

/// Holds the process-wide bearer credential and refreshes it on demand.
///
/// Refresh runs while the state lock is held, so concurrent callers that find
/// the token expired queue behind a single exchange and then reuse its result.
/// That includes a failure: callers queued behind a failed exchange all get its
/// `Auth` error, and only callers arriving afterwards start a new exchange.
pub struct AuthSession {
    exchange: Box<dyn CredentialExchange>,
    state: Mutex<SessionState>,
    /// Completed exchanges, written only while `state` is locked.
    refreshes: AtomicU64,
    leeway: chrono::Duration,
}

impl AuthSession {
    pub fn new(exchange: Box<dyn CredentialExchange>, refresh_leeway: Duration) -> Self {
        Self {
            exchange,
            state: Mutex::new(SessionState::default()),
            refreshes: AtomicU64::new(0),
            leeway: chrono::Duration::from_std(refresh_leeway).unwrap_or(chrono::Duration::zero()),
        }
    }

    /// Return a token that is not known to be expired, refreshing if needed.
    pub async fn current_token(&self) -> Result<BearerToken> {
        let seen = self.refreshes.load(Ordering::Acquire);
        let mut state = self.state.lock().await;

        if let Some(held) = state.held.as_ref() {
            if !held.is_expired(Utc::now(), self.leeway) {
                return Ok(held.bearer.clone());
            }
            tracing::debug!(expires_at = ?held.expires_at, "Access token expired, refreshing");
        }

        // An exchange finished while we queued; share its failure
        if self.refreshes.load(Ordering::Acquire) != seen {
            if let Some(err) = state.last_failure.as_ref() {
                return Err(err.clone());
            }
        }

        let outcome = self.exchange.exchange().await;
        self.refreshes.fetch_add(1, Ordering::AcqRel);

        match outcome {
            Ok(raw) => {
                let held = HeldToken::new(raw);
                tracing::info!(expires_at = ?held.expires_at, "Access token acquired");
                let bearer = held.bearer.clone();
                state.held = Some(held);
                state.last_failure = None;
                Ok(bearer)
            }
            Err(e) => {
                // Never fall back to the stale credential
                let err = e.into_auth();
                tracing::warn!(error = %err, "Access token refresh failed");
                state.held = None;
                state.last_failure = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Drop `rejected` if it is still the held token.
    ///
    /// A token that another caller already replaced is left alone.
    pub async fn invalidate(&self, rejected: &BearerToken) {
        let mut state = self.state.lock().await;
        if state.held.as_ref().is_some_and(|held| &held.bearer == rejected) {
            tracing::warn!("Access token rejected by server, discarding");
            state.held = None;
        }
    }

    pub async fn has_token(&self) -> bool {
        self.state.lock().await.held.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use async_trait::async_trait;
    use base64::Engine;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    fn jwt_expiring_at(exp: i64, marker: &str) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = engine.encode(r#"{"alg":"RS256"}"#);
        let payload = engine.encode(format!(r#"{{"sub":"{}","exp":{}}}"#, marker, exp));
        format!("{}.{}.sig", header, payload)
    }

    fn fresh(marker: &str) -> String {
        jwt_expiring_at(Utc::now().timestamp() + 3600, marker)
    }

    fn expired(marker: &str) -> String {
        jwt_expiring_at(Utc::now().timestamp() - 60, marker)
    }

    /// Replays scripted responses, then keeps returning fresh tokens.
    struct ScriptedExchange {
        calls: Arc<AtomicUsize>,
        script: std::sync::Mutex<VecDeque<Result<String>>>,
        delay: Duration,
    }

    impl ScriptedExchange {
        fn new(script: Vec<Result<String>>, delay: Duration) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let exchange = Self {
                calls: calls.clone(),
                script: std::sync::Mutex::new(script.into()),
                delay,
            };
            (exchange, calls)
        }
    }

    #[async_trait]
    impl CredentialExchange for ScriptedExchange {
        async fn exchange(&self) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(fresh(&format!("auto-{}", n))))
        }
    }

    fn session(script: Vec<Result<String>>, delay: Duration) -> (Arc<AuthSession>, Arc<AtomicUsize>) {
        let (exchange, calls) = ScriptedExchange::new(script, delay);
        (Arc::new(AuthSession::new(Box::new(exchange), Duration::ZERO)), calls)
    }

    #[tokio::test]
    async fn test_first_use_acquires_and_reuses() {
        let token = fresh("one");
        let (session, calls) = session(vec![Ok(token.clone())], Duration::ZERO);

        assert!(!session.has_token().await);
        let a = session.current_token().await.unwrap();
        let b = session.current_token().await.unwrap();

        assert_eq!(a.as_str(), token);
        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let old = expired("old");
        let new = fresh("new");
        let (session, calls) = session(vec![Ok(old.clone()), Ok(new.clone())], Duration::ZERO);

        // The first exchange hands back an already-expired token; it is used once
        assert_eq!(session.current_token().await.unwrap().as_str(), old);
        assert_eq!(session.current_token().await.unwrap().as_str(), new);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_is_single_flight() {
        let (session, calls) = session(vec![Ok(fresh("shared"))], Duration::from_millis(50));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let s = session.clone();
                tokio::spawn(async move { s.current_token().await })
            })
            .collect();

        let results = futures::future::join_all(handles).await;
        let first = results[0].as_ref().unwrap().as_ref().unwrap().clone();
        for r in &results {
            assert_eq!(r.as_ref().unwrap().as_ref().unwrap(), &first);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_auth_and_drops_stale_token() {
        let (session, calls) = session(
            vec![
                Ok(expired("stale")),
                Err(TokenizerError::transport("connection reset")),
            ],
            Duration::ZERO,
        );

        session.current_token().await.unwrap();
        let err = session.current_token().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert!(!session.has_token().await);

        // Next call tries again rather than reusing the stale token
        let token = session.current_token().await.unwrap();
        assert!(token.as_str().contains('.'));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_shared_by_queued_callers() {
        let (session, calls) = session(
            vec![Err(TokenizerError::from_response(
                500,
                br#"{"error":"idp down","request_id":"idp-1"}"#,
            ))],
            Duration::from_millis(100),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = session.clone();
                tokio::spawn(async move { s.current_token().await })
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            let err = result.unwrap().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Auth);
            assert_eq!(err.status(), Some(500));
            assert_eq!(err.request_id(), Some("idp-1"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!session.has_token().await);

        // A caller arriving after the failure starts a new exchange
        session.current_token().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_only_drops_matching_token() {
        let (session, calls) = session(vec![], Duration::ZERO);

        let current = session.current_token().await.unwrap();
        session.invalidate(&BearerToken::new("something-else")).await;
        assert!(session.has_token().await);

        session.invalidate(&current).await;
        assert!(!session.has_token().await);

        session.current_token().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_opaque_token_is_kept() {
        let (session, calls) = session(vec![Ok("opaque".to_string())], Duration::ZERO);
        session.current_token().await.unwrap();
        session.current_token().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_leeway_refreshes_early() {
        let soon = jwt_expiring_at(Utc::now().timestamp() + 10, "soon");
        let (exchange, calls) = ScriptedExchange::new(vec![Ok(soon)], Duration::ZERO);
        let session = AuthSession::new(Box::new(exchange), Duration::from_secs(60));

        session.current_token().await.unwrap();
        session.current_token().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_bearer_debug_is_redacted() {
        let token = BearerToken::new("secret-bearer");
        assert!(!format!("{:?}", token).contains("secret-bearer"));
    }
}

use std::fmt;
use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

/// Connection and credential settings for a [`crate::TokenizerClient`].
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub client_id: String,
    client_secret: Zeroizing<String>,
    /// Deadline for a whole call, credential refresh included.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Connection-failure retries for idempotent calls. 0 = disabled.
    pub network_retries: u32,
    /// Also retry create calls on connection failure. May duplicate resources.
    pub retry_non_idempotent: bool,
    /// Refresh the bearer token this long before its `exp` claim.
    pub refresh_leeway: Duration,
}

impl ClientConfig {
    pub fn new(
        base_url: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| anyhow::anyhow!("invalid tokenizer url '{}': {}", base_url, e))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("tokenizer url '{}' cannot be used as a base url", base_url);
        }

        Ok(Self {
            base_url,
            client_id: client_id.into(),
            client_secret: Zeroizing::new(client_secret.into()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            network_retries: 0,
            retry_non_idempotent: false,
            refresh_leeway: Duration::ZERO,
        })
    }

    pub fn client_secret(&self) -> &str {
        self.client_secret.as_str()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_network_retries(mut self, retries: u32) -> Self {
        self.network_retries = retries;
        self
    }

    pub fn with_retry_non_idempotent(mut self, enabled: bool) -> Self {
        self.retry_non_idempotent = enabled;
        self
    }

    pub fn with_refresh_leeway(mut self, leeway: Duration) -> Self {
        self.refresh_leeway = leeway;
        self
    }

    /// Absolute URL for a service path such as `/tokenizer/tokens`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            path
        )
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("network_retries", &self.network_retries)
            .field("retry_non_idempotent", &self.retry_non_idempotent)
            .field("refresh_leeway", &self.refresh_leeway)
            .finish()
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("{} must be set", name))
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Load configuration from the environment (and `.env`, when present).
pub fn load() -> anyhow::Result<ClientConfig> {
    dotenvy::dotenv().ok();

    let config = ClientConfig::new(
        &required("TOKENIZER_URL")?,
        required("TOKENIZER_CLIENT_ID")?,
        required("TOKENIZER_CLIENT_SECRET")?,
    )?
    .with_timeout(Duration::from_secs(parsed_or("TOKENIZER_TIMEOUT_SECS", 30)))
    .with_connect_timeout(Duration::from_secs(parsed_or(
        "TOKENIZER_CONNECT_TIMEOUT_SECS",
        5,
    )))
    .with_network_retries(parsed_or("TOKENIZER_NETWORK_RETRIES", 0))
    .with_retry_non_idempotent(parsed_or("TOKENIZER_RETRY_NON_IDEMPOTENT", false))
    .with_refresh_leeway(Duration::from_secs(parsed_or(
        "TOKENIZER_REFRESH_LEEWAY_SECS",
        0,
    )));

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let cfg = ClientConfig::new("https://tokenizer.example.com/", "id", "secret").unwrap();
        assert_eq!(
            cfg.endpoint("/tokenizer/tokens"),
            "https://tokenizer.example.com/tokenizer/tokens"
        );
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let cfg = ClientConfig::new("https://example.com/tenant-a", "id", "secret").unwrap();
        assert_eq!(cfg.endpoint("/oidc/token"), "https://example.com/tenant-a/oidc/token");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(ClientConfig::new("not a url", "id", "secret").is_err());
        assert!(ClientConfig::new("mailto:someone@example.com", "id", "secret").is_err());
    }

    #[test]
    fn test_defaults() {
        let cfg = ClientConfig::new("http://localhost:8080", "id", "secret").unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.network_retries, 0);
        assert!(!cfg.retry_non_idempotent);
        assert_eq!(cfg.refresh_leeway, Duration::ZERO);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let cfg = ClientConfig::new("http://localhost:8080", "my-id", "super-secret").unwrap();
        let dbg = format!("{:?}", cfg);
        assert!(dbg.contains("my-id"));
        assert!(!dbg.contains("super-secret"));
        assert_eq!(cfg.client_secret(), "super-secret");
    }
}

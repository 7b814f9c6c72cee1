use std::sync::Arc;
use std::time::Duration;

use crate::auth::CredentialExchange;
use crate::config::ClientConfig;
use crate::errors::Result;
use crate::executor::{within, RequestExecutor};
use crate::policy_store::PolicyStore;
use crate::tokens::TokenOperations;

/// Handle to a tokenizer deployment.
///
/// Cloning is cheap; clones share one credential session, so a refresh done
/// on behalf of one clone is reused by all of them.
#[derive(Clone)]
pub struct TokenizerClient {
    executor: Arc<RequestExecutor>,
    deadline: Duration,
}

impl TokenizerClient {
    /// Build a client that acquires its bearer token on first use.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let deadline = config.timeout;
        Ok(Self {
            executor: Arc::new(RequestExecutor::new(config)?),
            deadline,
        })
    }

    /// Build a client and acquire the bearer token before returning.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client.authenticate().await?;
        Ok(client)
    }

    /// Build a client around a custom credential source.
    pub fn with_exchange(config: ClientConfig, exchange: Box<dyn CredentialExchange>) -> Result<Self> {
        let deadline = config.timeout;
        Ok(Self {
            executor: Arc::new(RequestExecutor::with_exchange(config, exchange)?),
            deadline,
        })
    }

    /// A handle sharing this client's session whose calls use `deadline`.
    ///
    /// The deadline bounds the whole call, credential refresh included.
    pub fn with_timeout(&self, deadline: Duration) -> Self {
        Self {
            executor: self.executor.clone(),
            deadline,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn config(&self) -> &ClientConfig {
        self.executor.config()
    }

    /// Make sure a non-expired bearer token is held, exchanging credentials if not.
    pub async fn authenticate(&self) -> Result<()> {
        within(self.deadline, self.executor.session().current_token()).await?;
        Ok(())
    }

    pub fn policies(&self) -> PolicyStore<'_> {
        PolicyStore::new(&self.executor, self.deadline)
    }

    pub fn tokens(&self) -> TokenOperations<'_> {
        TokenOperations::new(&self.executor, self.deadline)
    }
}

impl std::fmt::Debug for TokenizerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizerClient")
            .field("config", self.executor.config())
            .field("deadline", &self.deadline)
            .finish()
    }
}

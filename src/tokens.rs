use std::time::Duration;

use reqwest::Method;

use crate::errors::Result;
use crate::executor::{within, Idempotency, RequestExecutor};
use crate::models::wire::{DataResponse, LookupResponse, ResolveRequest, TokenBinding, TokenRef};
use crate::models::{AccessPolicy, GenerationPolicy, InspectTokenResponse, ResolutionContext};

const TOKENS: &str = "/tokenizer/tokens";
const RESOLVE: &str = "/tokenizer/tokens/actions/resolve";
const INSPECT: &str = "/tokenizer/tokens/actions/inspect";
const LOOKUP: &str = "/tokenizer/tokens/actions/lookup";

/// Token lifecycle operations. Obtained from [`crate::TokenizerClient::tokens`].
pub struct TokenOperations<'a> {
    executor: &'a RequestExecutor,
    deadline: Duration,
}

impl<'a> TokenOperations<'a> {
    pub(crate) fn new(executor: &'a RequestExecutor, deadline: Duration) -> Self {
        Self { executor, deadline }
    }

    /// Tokenize `data` under the given policy pair and return the opaque token.
    pub async fn create_token(
        &self,
        data: &str,
        generation_policy: &GenerationPolicy,
        access_policy: &AccessPolicy,
    ) -> Result<String> {
        let body = TokenBinding {
            data,
            generation_policy,
            access_policy,
        };
        let resp: DataResponse = within(
            self.deadline,
            self.executor
                .execute(Method::POST, TOKENS, Some(&body), Idempotency::NonIdempotent),
        )
        .await?;
        Ok(resp.data)
    }

    /// Recover the plaintext behind `token`.
    ///
    /// The token's current access policy is evaluated against `context`.
    pub async fn resolve_token(&self, token: &str, context: &ResolutionContext) -> Result<String> {
        let body = ResolveRequest { token, context };
        let resp: DataResponse = within(
            self.deadline,
            self.executor
                .execute(Method::POST, RESOLVE, Some(&body), Idempotency::Idempotent),
        )
        .await?;
        Ok(resp.data)
    }

    /// Irreversibly remove a token. Returns whether a deletion took place.
    pub async fn delete_token(&self, token: &str) -> Result<bool> {
        let body = TokenRef { token };
        within(
            self.deadline,
            self.executor
                .execute_no_content(Method::DELETE, TOKENS, Some(&body), Idempotency::Idempotent),
        )
        .await
    }

    pub async fn inspect_token(&self, token: &str) -> Result<InspectTokenResponse> {
        let body = TokenRef { token };
        within(
            self.deadline,
            self.executor
                .execute(Method::POST, INSPECT, Some(&body), Idempotency::Idempotent),
        )
        .await
    }

    /// Every existing token created from `data` under this policy pair.
    ///
    /// May be empty, and may hold more than one token.
    pub async fn lookup_token(
        &self,
        data: &str,
        generation_policy: &GenerationPolicy,
        access_policy: &AccessPolicy,
    ) -> Result<Vec<String>> {
        let body = TokenBinding {
            data,
            generation_policy,
            access_policy,
        };
        let resp: LookupResponse = within(
            self.deadline,
            self.executor
                .execute(Method::POST, LOOKUP, Some(&body), Idempotency::Idempotent),
        )
        .await?;
        Ok(resp.tokens.unwrap_or_default())
    }
}

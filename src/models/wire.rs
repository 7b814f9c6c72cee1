//! Request and response bodies of the tokenizer HTTP API.

use serde::{Deserialize, Serialize};

use super::policy::{AccessPolicy, GenerationPolicy};
use super::token::ResolutionContext;

#[derive(Debug, Serialize)]
pub(crate) struct GenerationPolicyRequest<'a> {
    pub generation_policy: &'a GenerationPolicy,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerationPolicyResponse {
    pub generation_policy: GenerationPolicy,
}

#[derive(Debug, Serialize)]
pub(crate) struct AccessPolicyRequest<'a> {
    pub access_policy: &'a AccessPolicy,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccessPolicyResponse {
    pub access_policy: AccessPolicy,
}

#[derive(Debug, Serialize)]
pub(crate) struct AccessPolicyVersion {
    pub version: u64,
}

/// Shared by create-token and lookup-token.
#[derive(Debug, Serialize)]
pub(crate) struct TokenBinding<'a> {
    pub data: &'a str,
    pub generation_policy: &'a GenerationPolicy,
    pub access_policy: &'a AccessPolicy,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResolveRequest<'a> {
    pub token: &'a str,
    pub context: &'a ResolutionContext,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenRef<'a> {
    pub token: &'a str,
}

/// `{data}`: the token on create, the plaintext on resolve.
#[derive(Debug, Deserialize)]
pub(crate) struct DataResponse {
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LookupResponse {
    #[serde(default)]
    pub tokens: Option<Vec<String>>,
}

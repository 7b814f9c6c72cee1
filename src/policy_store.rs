use std::time::Duration;

use reqwest::Method;
use uuid::Uuid;

use crate::errors::Result;
use crate::executor::{within, Idempotency, RequestExecutor};
use crate::models::wire::{
    AccessPolicyRequest, AccessPolicyResponse, AccessPolicyVersion, GenerationPolicyRequest,
    GenerationPolicyResponse,
};
use crate::models::{AccessPolicy, GenerationPolicy};

const GENERATION_POLICIES: &str = "/tokenizer/policies/generation";
const ACCESS_POLICIES: &str = "/tokenizer/policies/access";

/// Policy management. Obtained from [`crate::TokenizerClient::policies`].
///
/// Generation policies can be created, listed and deleted but never updated.
/// Access policies are versioned: updates and deletes carry the version the
/// caller last observed and fail with `Conflict` when it is stale.
pub struct PolicyStore<'a> {
    executor: &'a RequestExecutor,
    deadline: Duration,
}

impl<'a> PolicyStore<'a> {
    pub(crate) fn new(executor: &'a RequestExecutor, deadline: Duration) -> Self {
        Self { executor, deadline }
    }

    // ── Generation policies ─────────────────────────────────────

    pub async fn create_generation_policy(&self, policy: &GenerationPolicy) -> Result<GenerationPolicy> {
        policy.validate()?;
        let body = GenerationPolicyRequest {
            generation_policy: policy,
        };
        let resp: GenerationPolicyResponse = within(
            self.deadline,
            self.executor
                .execute(Method::POST, GENERATION_POLICIES, Some(&body), Idempotency::NonIdempotent),
        )
        .await?;

        if resp.generation_policy.id != policy.id {
            tracing::info!(
                requested = %policy.id,
                assigned = %resp.generation_policy.id,
                "Server assigned a different generation policy id"
            );
        }
        Ok(resp.generation_policy)
    }

    pub async fn list_generation_policies(&self) -> Result<Vec<GenerationPolicy>> {
        within(
            self.deadline,
            self.executor
                .execute::<_, ()>(Method::GET, GENERATION_POLICIES, None, Idempotency::Idempotent),
        )
        .await
    }

    /// Permanently delete a generation policy.
    ///
    /// The server refuses while live tokens still reference it.
    pub async fn delete_generation_policy(&self, id: Uuid) -> Result<bool> {
        let path = format!("{}/{}", GENERATION_POLICIES, id);
        within(
            self.deadline,
            self.executor
                .execute_no_content::<()>(Method::DELETE, &path, None, Idempotency::Idempotent),
        )
        .await
    }

    // ── Access policies ─────────────────────────────────────────

    pub async fn create_access_policy(&self, policy: &AccessPolicy) -> Result<AccessPolicy> {
        policy.validate()?;
        let body = AccessPolicyRequest {
            access_policy: policy,
        };
        let resp: AccessPolicyResponse = within(
            self.deadline,
            self.executor
                .execute(Method::POST, ACCESS_POLICIES, Some(&body), Idempotency::NonIdempotent),
        )
        .await?;
        Ok(resp.access_policy)
    }

    pub async fn list_access_policies(&self) -> Result<Vec<AccessPolicy>> {
        within(
            self.deadline,
            self.executor
                .execute::<_, ()>(Method::GET, ACCESS_POLICIES, None, Idempotency::Idempotent),
        )
        .await
    }

    /// Replace name, function and parameters of an access policy.
    ///
    /// `policy.version` must be the version currently stored; the returned
    /// policy carries `version + 1`.
    pub async fn update_access_policy(&self, policy: &AccessPolicy) -> Result<AccessPolicy> {
        policy.validate()?;
        let path = format!("{}/{}", ACCESS_POLICIES, policy.id);
        let body = AccessPolicyRequest {
            access_policy: policy,
        };
        // Replays carry the old version and come back as Conflict
        let resp: AccessPolicyResponse = within(
            self.deadline,
            self.executor
                .execute(Method::PUT, &path, Some(&body), Idempotency::Idempotent),
        )
        .await?;

        let updated = resp.access_policy;
        if updated.version != policy.version + 1 {
            tracing::warn!(
                id = %policy.id,
                sent = policy.version,
                returned = updated.version,
                "Access policy version did not advance by one"
            );
        }
        Ok(updated)
    }

    /// Permanently delete an access policy if `version` is still current.
    pub async fn delete_access_policy(&self, id: Uuid, version: u64) -> Result<bool> {
        let path = format!("{}/{}", ACCESS_POLICIES, id);
        let body = AccessPolicyVersion { version };
        within(
            self.deadline,
            self.executor
                .execute_no_content(Method::DELETE, &path, Some(&body), Idempotency::Idempotent),
        )
        .await
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::policy::{AccessPolicy, GenerationPolicy};

/// Open key/value context an access policy is evaluated against.
pub type ResolutionContext = serde_json::Map<String, serde_json::Value>;

/// Metadata of a token, with the policies it is bound to as they are now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectTokenResponse {
    pub id: Uuid,
    pub token: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub generation_policy: GenerationPolicy,
    pub access_policy: AccessPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "id": "7d2c4a52-5d49-4bb4-9a4c-3f1f1d7f0a11",
            "token": "2c3b1f2e-8d6a-4f0e-b3a7-0c1d2e3f4a5b",
            "created": "2024-03-01T12:00:00Z",
            "updated": "2024-03-02T08:30:00.250+00:00",
            "generation_policy": {
                "id": "f5bce640-f866-4464-af1a-9e7474c4a90c",
                "name": "uuid",
                "function": "function policy(x, y) { return uuid() }",
                "parameters": "{}"
            },
            "access_policy": {
                "id": "1bf2b775-e521-41d3-8b7e-78e89427e6fe",
                "name": "open",
                "function": "function policy(x, y) { return true }",
                "parameters": "{}",
                "version": 3
            }
        })
    }

    #[test]
    fn test_decode_inspect_response() {
        let r: InspectTokenResponse = serde_json::from_value(sample()).unwrap();
        assert_eq!(r.token, "2c3b1f2e-8d6a-4f0e-b3a7-0c1d2e3f4a5b");
        assert_eq!(r.created.to_rfc3339(), "2024-03-01T12:00:00+00:00");
        assert!(r.updated > r.created);
        assert_eq!(r.generation_policy.name, "uuid");
        assert_eq!(r.access_policy.version, 3);
    }

    #[test]
    fn test_encode_keeps_both_policies_under_their_own_keys() {
        let r: InspectTokenResponse = serde_json::from_value(sample()).unwrap();
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["generation_policy"]["id"], "f5bce640-f866-4464-af1a-9e7474c4a90c");
        assert_eq!(v["access_policy"]["id"], "1bf2b775-e521-41d3-8b7e-78e89427e6fe");
        assert!(v["generation_policy"].get("version").is_none());
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, TokenizerError};

/// First version of every access policy.
pub const INITIAL_VERSION: u64 = 1;

fn require_non_empty(kind: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TokenizerError::validation(format!(
            "{} policy {} must not be empty",
            kind, field
        )));
    }
    Ok(())
}

/// Rules that shape how a token is produced from data.
///
/// Immutable on the server once created: there is no update path, only delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationPolicy {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    /// Policy logic, evaluated server-side.
    #[serde(default)]
    pub function: String,
    /// Opaque, usually JSON.
    #[serde(default)]
    pub parameters: String,
}

impl GenerationPolicy {
    /// A complete policy, ready to be created.
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        function: impl Into<String>,
        parameters: impl Into<String>,
    ) -> Result<Self> {
        let policy = Self {
            id,
            name: name.into(),
            function: function.into(),
            parameters: parameters.into(),
        };
        policy.validate()?;
        Ok(policy)
    }

    /// An id-only handle for passing an existing policy to token operations.
    pub fn reference(id: Uuid) -> Self {
        Self {
            id,
            name: String::new(),
            function: String::new(),
            parameters: String::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("generation", "name", &self.name)?;
        require_non_empty("generation", "function", &self.function)
    }
}

/// Rules that decide whether a token may be resolved for a given context.
///
/// Mutable and version-guarded: every successful update bumps `version` by one,
/// and updates/deletes must present the version the caller last saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub parameters: String,
    pub version: u64,
}

impl AccessPolicy {
    /// A new policy at version 1.
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        function: impl Into<String>,
        parameters: impl Into<String>,
    ) -> Result<Self> {
        let policy = Self {
            id,
            name: name.into(),
            function: function.into(),
            parameters: parameters.into(),
            version: INITIAL_VERSION,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn reference(id: Uuid) -> Self {
        Self {
            id,
            name: String::new(),
            function: String::new(),
            parameters: String::new(),
            version: INITIAL_VERSION,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("access", "name", &self.name)?;
        require_non_empty("access", "function", &self.function)?;
        if self.version < INITIAL_VERSION {
            return Err(TokenizerError::validation(format!(
                "access policy version must be at least {}",
                INITIAL_VERSION
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_generation_policy_requires_name_and_function() {
        let id = Uuid::new_v4();
        assert!(GenerationPolicy::new(id, "email", "function policy(x) { return x }", "{}").is_ok());

        let err = GenerationPolicy::new(id, "  ", "function f() {}", "{}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.message().contains("name"));
        assert!(err.status().is_none());

        let err = GenerationPolicy::new(id, "email", "", "{}").unwrap_err();
        assert!(err.message().contains("function"));
    }

    #[test]
    fn test_access_policy_starts_at_version_one() {
        let p = AccessPolicy::new(Uuid::new_v4(), "open", "function policy() { return true }", "").unwrap();
        assert_eq!(p.version, 1);
    }

    #[test]
    fn test_access_policy_rejects_version_zero() {
        let mut p = AccessPolicy::new(Uuid::new_v4(), "open", "function policy() { return true }", "").unwrap();
        p.version = 0;
        assert_eq!(p.validate().unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_reference_is_not_creatable() {
        assert!(GenerationPolicy::reference(Uuid::nil()).validate().is_err());
        assert!(AccessPolicy::reference(Uuid::nil()).validate().is_err());
    }

    #[test]
    fn test_access_policy_wire_shape() {
        let id = Uuid::parse_str("1bf2b775-e521-41d3-8b7e-78e89427e6fe").unwrap();
        let p = AccessPolicy::new(id, "open", "function policy() { return true }", "{}").unwrap();
        assert_eq!(
            serde_json::to_value(&p).unwrap(),
            json!({
                "id": "1bf2b775-e521-41d3-8b7e-78e89427e6fe",
                "name": "open",
                "function": "function policy() { return true }",
                "parameters": "{}",
                "version": 1
            })
        );
    }

    #[test]
    fn test_decode_tolerates_missing_optional_text() {
        let p: GenerationPolicy =
            serde_json::from_value(json!({"id": "f5bce640-f866-4464-af1a-9e7474c4a90c"})).unwrap();
        assert_eq!(p, GenerationPolicy::reference(p.id));

        // version is mandatory on access policies
        let r: std::result::Result<AccessPolicy, _> =
            serde_json::from_value(json!({"id": "1bf2b775-e521-41d3-8b7e-78e89427e6fe"}));
        assert!(r.is_err());
    }
}

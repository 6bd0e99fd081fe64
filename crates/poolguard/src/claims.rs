//! Decoded access-token claim set

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Claims carried by a verified access token.
///
/// The required fields are the ones the verification policy consumes; a token
/// missing any of them is rejected as malformed before policy runs. Anything
/// else the pool adds (custom attributes, device keys) is retained in
/// `additional` so callers can consume it without this crate enumerating
/// every provider-specific claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject identifier, the pool-unique user id.
    pub sub: String,

    /// Issuer URL; must exactly equal the configured pool issuer.
    pub iss: String,

    /// Intended-use marker; `"access"` for access tokens, `"id"` for ID tokens.
    pub token_use: String,

    /// Expiration time, seconds since epoch.
    pub exp: u64,

    /// When the user authenticated, seconds since epoch.
    pub auth_time: u64,

    /// Pool username, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// App-client the token was issued to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Space-separated OAuth scopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Issued-at time, seconds since epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    /// Token identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Group memberships from the `cognito:groups` claim; empty when the
    /// pool put the user in no groups.
    #[serde(rename = "cognito:groups", default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,

    /// Remaining claims not modeled above.
    #[serde(flatten)]
    pub additional: HashMap<String, serde_json::Value>,
}

impl AccessClaims {
    /// Whether the subject is in the named pool group.
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "sub": "5be86359-073c-434b-ad30-24f91d7de95f",
            "iss": "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_AbCdEf123",
            "token_use": "access",
            "exp": 1_700_003_600u64,
            "auth_time": 1_700_000_000u64,
            "username": "alice",
            "client_id": "7jk05nvkfss3eyqbcnr0hq2or2",
            "scope": "aws.cognito.signin.user.admin",
            "iat": 1_700_000_000u64,
            "jti": "f7a1-4c3d",
            "cognito:groups": ["Admin", "shop manager"],
            "device_key": "us-east-1_d1"
        })
    }

    #[test]
    fn test_deserialize_full_claim_set() {
        let claims: AccessClaims = serde_json::from_value(sample()).unwrap();

        assert_eq!(claims.sub, "5be86359-073c-434b-ad30-24f91d7de95f");
        assert_eq!(claims.token_use, "access");
        assert_eq!(claims.exp, 1_700_003_600);
        assert_eq!(claims.auth_time, 1_700_000_000);
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert_eq!(claims.groups, vec!["Admin", "shop manager"]);
        assert!(claims.in_group("Admin"));
        assert!(!claims.in_group("Nobody"));
        assert_eq!(claims.additional["device_key"], json!("us-east-1_d1"));
    }

    #[test]
    fn test_groups_default_to_empty() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("cognito:groups");

        let claims: AccessClaims = serde_json::from_value(value).unwrap();
        assert!(claims.groups.is_empty());
    }

    #[test]
    fn test_missing_required_field_fails() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("auth_time");

        assert!(serde_json::from_value::<AccessClaims>(value).is_err());
    }
}

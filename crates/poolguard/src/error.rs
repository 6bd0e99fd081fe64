//! Verification rejection taxonomy
//!
//! Every way a token can fail verification has a dedicated variant, so audit
//! logs can distinguish them. The application layer must treat any rejection
//! uniformly as access-denied: the specific reason is for logging only and
//! must never be surfaced to the token holder.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a token was rejected.
///
/// Messages never contain token material or key contents. `Clone` because the
/// error is embedded in [`crate::Verification::Invalid`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// The token string does not have the expected segment structure.
    #[error("requested token is invalid")]
    MalformedToken,

    /// The token header names a key id the cached key set does not contain.
    ///
    /// A token referencing a key the IdP never published and a cache that has
    /// not observed a key rotation are indistinguishable here; both reject.
    #[error("claim made for unknown kid '{kid}'")]
    UnknownSigningKey {
        /// Key id from the token header, empty when the header had none.
        kid: String,
    },

    /// The signature does not verify against the selected key, or the token
    /// uses a disallowed algorithm.
    #[error("token signature could not be verified")]
    SignatureInvalid,

    /// The token is expired, or its authentication time lies in the future.
    #[error("claim is expired or invalid: {detail}")]
    ClaimExpired {
        /// Which temporal check failed.
        detail: &'static str,
    },

    /// The `iss` claim does not exactly equal the configured issuer.
    #[error("claim issuer is invalid (expected '{expected}', found '{found}')")]
    IssuerMismatch {
        /// Issuer the verifier was configured with.
        expected: String,
        /// Issuer the token carried.
        found: String,
    },

    /// The `token_use` claim is not the expected `"access"` marker.
    #[error("claim use is not access (found '{found}')")]
    WrongTokenUse {
        /// The `token_use` value the token carried.
        found: String,
    },

    /// The JWKS document could not be fetched or contained no usable keys.
    ///
    /// Infrastructure-level, distinct from the claim-rejection kinds above;
    /// callers may retry, the cache stays unpopulated after this.
    #[error("key set unavailable: {detail}")]
    KeySetUnavailable {
        /// Fetch or parse failure detail.
        detail: String,
    },
}

impl VerifyError {
    /// Stable, log-friendly discriminant for this rejection.
    pub fn kind(&self) -> RejectKind {
        match self {
            Self::MalformedToken => RejectKind::MalformedToken,
            Self::UnknownSigningKey { .. } => RejectKind::UnknownSigningKey,
            Self::SignatureInvalid => RejectKind::SignatureInvalid,
            Self::ClaimExpired { .. } => RejectKind::ClaimExpired,
            Self::IssuerMismatch { .. } => RejectKind::IssuerMismatch,
            Self::WrongTokenUse { .. } => RejectKind::WrongTokenUse,
            Self::KeySetUnavailable { .. } => RejectKind::KeySetUnavailable,
        }
    }
}

/// Rejection discriminant used by audit records and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectKind {
    /// See [`VerifyError::MalformedToken`].
    MalformedToken,
    /// See [`VerifyError::UnknownSigningKey`].
    UnknownSigningKey,
    /// See [`VerifyError::SignatureInvalid`].
    SignatureInvalid,
    /// See [`VerifyError::ClaimExpired`].
    ClaimExpired,
    /// See [`VerifyError::IssuerMismatch`].
    IssuerMismatch,
    /// See [`VerifyError::WrongTokenUse`].
    WrongTokenUse,
    /// See [`VerifyError::KeySetUnavailable`].
    KeySetUnavailable,
}

impl RejectKind {
    /// Snake-case name matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedToken => "malformed_token",
            Self::UnknownSigningKey => "unknown_signing_key",
            Self::SignatureInvalid => "signature_invalid",
            Self::ClaimExpired => "claim_expired",
            Self::IssuerMismatch => "issuer_mismatch",
            Self::WrongTokenUse => "wrong_token_use",
            Self::KeySetUnavailable => "key_set_unavailable",
        }
    }
}

impl std::fmt::Display for RejectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(VerifyError::MalformedToken.kind(), RejectKind::MalformedToken);
        assert_eq!(
            VerifyError::UnknownSigningKey { kid: "abc".into() }.kind(),
            RejectKind::UnknownSigningKey
        );
        assert_eq!(
            VerifyError::KeySetUnavailable { detail: "timeout".into() }.kind(),
            RejectKind::KeySetUnavailable
        );
    }

    #[test]
    fn test_kind_display_matches_serde() {
        let json = serde_json::to_string(&RejectKind::WrongTokenUse).unwrap();
        assert_eq!(json, format!("\"{}\"", RejectKind::WrongTokenUse));
    }

    #[test]
    fn test_messages_carry_no_token_material() {
        let err = VerifyError::IssuerMismatch {
            expected: "https://cognito-idp.us-east-1.amazonaws.com/pool".into(),
            found: "https://evil.example.com".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("issuer is invalid"));
        assert!(!msg.contains("eyJ"));
    }
}

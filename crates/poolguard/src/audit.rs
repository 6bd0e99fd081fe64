//! Structured audit logging for verification events
//!
//! Every verification attempt emits one entry, and every outcome emits a
//! second one naming the now-trusted subject or the rejection kind. Entries
//! never contain token material or key contents.
//!
//! Events flow through the `tracing` ecosystem under the `audit::verify`
//! target, so deployments can route the audit trail independently of
//! operational logs.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::RejectKind;

/// Audit log for token verification events.
///
/// Supports identifier hashing for deployments where subject ids must not
/// appear in plaintext logs.
#[derive(Debug, Clone)]
pub struct AuditLog {
    /// Service name for event attribution
    service: String,
    /// Whether to hash subject identifiers before logging
    hash_identifiers: bool,
}

impl AuditLog {
    /// Create an audit log attributing events to the given service.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            hash_identifiers: false,
        }
    }

    /// Create a privacy-focused audit log that hashes subject identifiers.
    pub fn privacy_focused(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            hash_identifiers: true,
        }
    }

    /// Builder method to configure identifier hashing.
    pub fn with_identifier_hashing(mut self, hash: bool) -> Self {
        self.hash_identifiers = hash;
        self
    }

    /// Log a verification event.
    pub fn log(&self, event: VerifyEvent) {
        let record = AuditRecord {
            id: Uuid::now_v7(),
            timestamp: SystemTime::now(),
            service: self.service.clone(),
            event,
        };

        match &record.event {
            VerifyEvent::Attempt => {
                info!(
                    target: "audit::verify",
                    audit_id = %record.id,
                    event_type = "verify_attempt",
                    service = %self.service,
                    "Token verification attempted"
                );
            }
            VerifyEvent::Confirmed { sub, username } => {
                info!(
                    target: "audit::verify",
                    audit_id = %record.id,
                    event_type = "claim_confirmed",
                    sub = %self.maybe_hash(sub),
                    username = ?username.as_ref().map(|u| self.maybe_hash(u)),
                    service = %self.service,
                    "Claim confirmed"
                );
            }
            VerifyEvent::Rejected { kind, detail } => {
                warn!(
                    target: "audit::verify",
                    audit_id = %record.id,
                    event_type = "claim_rejected",
                    kind = %kind,
                    detail = %detail,
                    service = %self.service,
                    "Token rejected"
                );
            }
        }
    }

    fn maybe_hash(&self, value: &str) -> String {
        if self.hash_identifiers {
            let hash = blake3::hash(value.as_bytes());
            format!("blake3:{}", &hash.to_hex()[..16])
        } else {
            value.to_string()
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new("poolguard")
    }
}

/// Verification event types for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VerifyEvent {
    /// A verification was requested (before any checking).
    Attempt,

    /// All checks passed; the subject is now trusted.
    Confirmed {
        /// Verified subject identifier
        sub: String,
        /// Pool username, when the token carried one
        #[serde(skip_serializing_if = "Option::is_none")]
        username: Option<String>,
    },

    /// The token was rejected.
    Rejected {
        /// Stable rejection discriminant
        kind: RejectKind,
        /// Human-readable detail (no token material)
        detail: String,
    },
}

/// Audit record wrapping an event with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique audit record ID
    pub id: Uuid,
    /// Timestamp of the event
    #[serde(with = "system_time_serde")]
    pub timestamp: SystemTime,
    /// Service that generated the event
    pub service: String,
    /// The verification event
    pub event: VerifyEvent,
}

mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_secs(secs))
    }
}

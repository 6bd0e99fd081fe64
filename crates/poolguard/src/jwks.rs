//! JWKS fetching and the populate-once key set cache
//!
//! The cache owns the mapping from key id to verification-ready public key.
//! It fetches the pool's JWKS document over HTTPS exactly once, on first use,
//! and serves the parsed mapping from memory for the remainder of the process
//! lifetime.
//!
//! # Staleness trade-off
//!
//! There is deliberately no TTL, no refresh timer, and no invalidation: a key
//! the IdP rotates in after population is never picked up without recreating
//! the cache. Tokens signed with such a key are rejected as
//! [`VerifyError::UnknownSigningKey`]. A failed fetch leaves the cache
//! unpopulated, so a later call may retry.
//!
//! # Security Considerations
//!
//! - HTTPS required for the JWKS endpoint (HTTP only allowed for loopback)
//! - The fetch is bounded by the HTTP client timeout; a hung IdP surfaces as
//!   [`VerifyError::KeySetUnavailable`] rather than stalling callers
//! - Key material is never logged; [`VerificationKey`] redacts it from `Debug`

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::{Jwk, JwkSet, KeyAlgorithm};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::error::VerifyError;

/// Mapping from key id to verification-ready key, immutable once published.
pub type KeyMap = HashMap<String, VerificationKey>;

/// One published signing key, converted from its JWKS form exactly once.
#[derive(Clone)]
pub struct VerificationKey {
    kid: String,
    algorithm: Option<KeyAlgorithm>,
    key: DecodingKey,
}

impl VerificationKey {
    fn from_jwk(jwk: &Jwk) -> Result<Self, String> {
        let kid = jwk
            .common
            .key_id
            .clone()
            .ok_or_else(|| "published key has no kid".to_string())?;
        let key =
            DecodingKey::from_jwk(jwk).map_err(|e| format!("unusable key material: {e}"))?;

        Ok(Self {
            kid,
            algorithm: jwk.common.key_algorithm,
            key,
        })
    }

    /// Key id this key was published under.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Algorithm the IdP advertised for this key, when it did.
    pub fn algorithm(&self) -> Option<KeyAlgorithm> {
        self.algorithm
    }

    /// The verification-ready key for signature checks.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

// Manual Debug impl to keep key material out of logs
impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Source of the pool's verification keys.
///
/// The seam between the verifier and the network: production uses
/// [`KeySetCache`], tests substitute an in-memory implementation so no
/// verification test needs a live IdP.
#[async_trait]
pub trait KeySource: Send + Sync {
    /// The current key mapping, fetching it if this source has never
    /// observed one.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::KeySetUnavailable`] when the key set cannot be
    /// obtained.
    async fn keys(&self) -> Result<Arc<KeyMap>, VerifyError>;
}

/// JWKS cache that fetches once and serves from memory thereafter.
///
/// Concurrent cold calls are serialized behind a single fetch, so N workers
/// racing on an empty cache trigger exactly one HTTP request. Clones share
/// the same cache cell.
///
/// # Example
///
/// ```rust,no_run
/// # use poolguard::jwks::{KeySetCache, KeySource};
/// # tokio_test::block_on(async {
/// let cache = KeySetCache::new(
///     "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_ExAmPlE/.well-known/jwks.json",
/// );
///
/// let keys = cache.keys().await?;
/// if let Some(key) = keys.get("key-id-123") {
///     // use key for signature verification
/// }
/// # Ok::<(), poolguard::VerifyError>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct KeySetCache {
    /// JWKS endpoint URL
    jwks_url: String,
    /// HTTP client
    http_client: reqwest::Client,
    /// Populated at most once per process lifetime
    keys: Arc<OnceCell<Arc<KeyMap>>>,
}

impl KeySetCache {
    /// Default bound on the JWKS fetch.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a cache for the given JWKS endpoint with the default timeout.
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self::with_timeout(jwks_url, Self::DEFAULT_TIMEOUT)
    }

    /// Create a cache with a custom fetch timeout.
    ///
    /// The timeout is the only bound on the fetch; a hung IdP surfaces as
    /// [`VerifyError::KeySetUnavailable`] once it elapses.
    pub fn with_timeout(jwks_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            keys: Arc::new(OnceCell::new()),
        }
    }

    /// The JWKS endpoint URL this cache fetches from.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Fetch the JWKS document and convert every usable entry.
    async fn fetch(&self) -> Result<Arc<KeyMap>, VerifyError> {
        info!(jwks_url = %self.jwks_url, "Fetching JWKS from endpoint");

        if !self.jwks_url.starts_with("https://")
            && !self.jwks_url.starts_with("http://localhost")
            && !self.jwks_url.starts_with("http://127.0.0.1")
        {
            return Err(VerifyError::KeySetUnavailable {
                detail: "JWKS endpoint must use HTTPS (HTTP only allowed for loopback)"
                    .to_string(),
            });
        }

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                error!(jwks_url = %self.jwks_url, error = %e, "Failed to fetch JWKS");
                VerifyError::KeySetUnavailable {
                    detail: format!("JWKS fetch failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            error!(
                jwks_url = %self.jwks_url,
                status = %response.status(),
                "JWKS endpoint returned error status"
            );
            return Err(VerifyError::KeySetUnavailable {
                detail: format!("JWKS endpoint returned status {}", response.status()),
            });
        }

        let jwks: JwkSet = response.json().await.map_err(|e| {
            error!(jwks_url = %self.jwks_url, error = %e, "Failed to parse JWKS JSON");
            VerifyError::KeySetUnavailable {
                detail: format!("invalid JWKS document: {e}"),
            }
        })?;

        let mut map = KeyMap::with_capacity(jwks.keys.len());
        for jwk in &jwks.keys {
            match VerificationKey::from_jwk(jwk) {
                Ok(key) => {
                    map.insert(key.kid().to_string(), key);
                }
                Err(reason) => {
                    warn!(jwks_url = %self.jwks_url, reason = %reason, "Skipping JWKS entry");
                }
            }
        }

        if map.is_empty() {
            error!(jwks_url = %self.jwks_url, "JWKS document contained no usable keys");
            return Err(VerifyError::KeySetUnavailable {
                detail: "JWKS document contained no usable keys".to_string(),
            });
        }

        info!(
            jwks_url = %self.jwks_url,
            key_count = map.len(),
            "Successfully fetched JWKS"
        );

        Ok(Arc::new(map))
    }
}

#[async_trait]
impl KeySource for KeySetCache {
    async fn keys(&self) -> Result<Arc<KeyMap>, VerifyError> {
        if let Some(keys) = self.keys.get() {
            debug!(jwks_url = %self.jwks_url, "Using cached JWKS");
            return Ok(Arc::clone(keys));
        }

        // Cold path: concurrent callers are serialized behind one fetch; a
        // failed fetch leaves the cell empty so a later call retries.
        self.keys
            .get_or_try_init(|| self.fetch())
            .await
            .map(Arc::clone)
    }
}

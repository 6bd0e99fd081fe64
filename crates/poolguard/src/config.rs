//! Pool configuration and issuer derivation
//!
//! The expected issuer and the JWKS document URL are derived once at
//! construction time from the identity-provider region and the user-pool id:
//!
//! - issuer: `https://cognito-idp.<region>.amazonaws.com/<pool-id>`
//! - JWKS:   `<issuer>/.well-known/jwks.json`
//!
//! Configuration failures are startup-fatal for the caller ([`ConfigError`]),
//! never per-token `Invalid` results.

use thiserror::Error;
use url::Url;

/// Environment variable holding the identity-provider region.
pub const REGION_ENV_VAR: &str = "AWS_REGION";
/// Environment variable holding the user-pool identifier.
pub const POOL_ID_ENV_VAR: &str = "AWS_POOL_ID";

/// Configuration errors, distinct from the per-token rejection taxonomy.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The identity-provider region was absent or empty.
    #[error("identity-provider region is required (set {REGION_ENV_VAR} or pass it explicitly)")]
    MissingRegion,

    /// The user-pool identifier was absent or empty.
    #[error("env var required for cognito pool (set {POOL_ID_ENV_VAR} or pass it explicitly)")]
    MissingPoolId,

    /// An explicitly supplied issuer or JWKS URL did not parse.
    #[error("invalid {what} URL '{url}'")]
    InvalidUrl {
        /// Which URL failed ("issuer" or "JWKS").
        what: &'static str,
        /// The offending value.
        url: String,
        /// Parse failure detail.
        #[source]
        source: url::ParseError,
    },
}

/// Identity-provider pool configuration.
///
/// Holds the expected issuer and the JWKS URL the verifier trusts. Construct
/// with [`PoolConfig::new`] for a real Cognito pool, [`PoolConfig::from_env`]
/// for env-driven bootstrap, or [`PoolConfig::with_issuer`] to point at an
/// arbitrary issuer (local test servers, cognito-local).
#[derive(Debug, Clone)]
pub struct PoolConfig {
    region: String,
    pool_id: String,
    issuer: String,
    jwks_url: String,
}

impl PoolConfig {
    /// Derive the issuer and JWKS URL for a Cognito user pool.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRegion`] or [`ConfigError::MissingPoolId`]
    /// when either value is empty.
    pub fn new(region: impl Into<String>, pool_id: impl Into<String>) -> Result<Self, ConfigError> {
        let region = region.into();
        let pool_id = pool_id.into();

        if region.trim().is_empty() {
            return Err(ConfigError::MissingRegion);
        }
        if pool_id.trim().is_empty() {
            return Err(ConfigError::MissingPoolId);
        }

        let issuer = format!("https://cognito-idp.{region}.amazonaws.com/{pool_id}");
        let jwks_url = format!("{issuer}/.well-known/jwks.json");

        Ok(Self {
            region,
            pool_id,
            issuer,
            jwks_url,
        })
    }

    /// Read the region and pool id from `AWS_REGION` / `AWS_POOL_ID`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRegion`] or [`ConfigError::MissingPoolId`]
    /// when a variable is unset or empty. Intended to fail at process startup,
    /// not per verification call.
    pub fn from_env() -> Result<Self, ConfigError> {
        let region = std::env::var(REGION_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingRegion)?;
        let pool_id = std::env::var(POOL_ID_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingPoolId)?;
        Self::new(region, pool_id)
    }

    /// Use an explicit issuer and JWKS URL instead of the Cognito derivation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] when either value is not a valid URL.
    pub fn with_issuer(
        issuer: impl Into<String>,
        jwks_url: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let issuer = issuer.into();
        let jwks_url = jwks_url.into();

        Url::parse(&issuer).map_err(|source| ConfigError::InvalidUrl {
            what: "issuer",
            url: issuer.clone(),
            source,
        })?;
        Url::parse(&jwks_url).map_err(|source| ConfigError::InvalidUrl {
            what: "JWKS",
            url: jwks_url.clone(),
            source,
        })?;

        Ok(Self {
            region: String::new(),
            pool_id: String::new(),
            issuer,
            jwks_url,
        })
    }

    /// Identity-provider region, empty when constructed via [`PoolConfig::with_issuer`].
    pub fn region(&self) -> &str {
        &self.region
    }

    /// User-pool identifier, empty when constructed via [`PoolConfig::with_issuer`].
    pub fn pool_id(&self) -> &str {
        &self.pool_id
    }

    /// The exact issuer string a token's `iss` claim must equal.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// URL of the JWKS document published by the pool.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cognito_issuer_derivation() {
        let config = PoolConfig::new("us-east-1", "us-east-1_AbCdEf123").unwrap();

        assert_eq!(
            config.issuer(),
            "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_AbCdEf123"
        );
        assert_eq!(
            config.jwks_url(),
            "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_AbCdEf123/.well-known/jwks.json"
        );
        assert_eq!(config.region(), "us-east-1");
        assert_eq!(config.pool_id(), "us-east-1_AbCdEf123");
    }

    #[test]
    fn test_missing_pool_id_is_fatal() {
        let err = PoolConfig::new("us-east-1", "").unwrap_err();
        assert!(matches!(err, ConfigError::MissingPoolId));

        let err = PoolConfig::new("us-east-1", "   ").unwrap_err();
        assert!(matches!(err, ConfigError::MissingPoolId));
    }

    #[test]
    fn test_missing_region_is_fatal() {
        let err = PoolConfig::new("", "us-east-1_AbCdEf123").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRegion));
    }

    #[test]
    fn test_explicit_issuer() {
        let config = PoolConfig::with_issuer(
            "http://127.0.0.1:9229/local-pool",
            "http://127.0.0.1:9229/local-pool/.well-known/jwks.json",
        )
        .unwrap();

        assert_eq!(config.issuer(), "http://127.0.0.1:9229/local-pool");
        assert!(config.region().is_empty());
    }

    #[test]
    fn test_explicit_issuer_rejects_garbage() {
        let err = PoolConfig::with_issuer("not a url", "http://127.0.0.1/jwks.json").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { what: "issuer", .. }));

        let err = PoolConfig::with_issuer("http://127.0.0.1/pool", "::::").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { what: "JWKS", .. }));
    }
}

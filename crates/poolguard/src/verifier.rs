//! Token verification pipeline
//!
//! Decides whether a token is authentic and currently valid, and surfaces the
//! decoded claims if so. Per call the pipeline is terminal on first failure:
//!
//! ```text
//! SplitSegments -> DecodeHeader -> ResolveKey -> VerifySignature
//!     -> CheckExpiry -> CheckIssuer -> CheckTokenUse -> Valid
//! ```
//!
//! Every arrow is also reachable as a transition to `Invalid(reason)`, and
//! `verify` never raises: all failures, including an unreachable JWKS
//! endpoint, are recovered into [`Verification::Invalid`].

use jsonwebtoken::{Algorithm, TokenData, Validation, decode, decode_header};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::audit::{AuditLog, VerifyEvent};
use crate::claims::AccessClaims;
use crate::clock::{Clock, SystemClock};
use crate::config::PoolConfig;
use crate::error::VerifyError;
use crate::jwks::{KeySetCache, KeySource};

/// The `token_use` marker access tokens must carry.
const EXPECTED_TOKEN_USE: &str = "access";

/// Outcome of one verification attempt. Never partially valid: claims are
/// only present when every check passed.
#[derive(Debug, Clone)]
pub enum Verification {
    /// Signature and all claim checks passed.
    Valid(AccessClaims),
    /// The token was rejected; the reason is for audit logs only and must not
    /// reach the token holder.
    Invalid(VerifyError),
}

impl Verification {
    /// Whether the token passed every check.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The verified claims, when valid.
    pub fn claims(&self) -> Option<&AccessClaims> {
        match self {
            Self::Valid(claims) => Some(claims),
            Self::Invalid(_) => None,
        }
    }

    /// The rejection reason, when invalid.
    pub fn reason(&self) -> Option<&VerifyError> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(err) => Some(err),
        }
    }

    /// Unwrap into claims or the rejection reason.
    ///
    /// # Errors
    ///
    /// Returns the [`VerifyError`] carried by an invalid result.
    pub fn into_claims(self) -> Result<AccessClaims, VerifyError> {
        match self {
            Self::Valid(claims) => Ok(claims),
            Self::Invalid(err) => Err(err),
        }
    }
}

/// Access-token verifier for one user pool.
///
/// Cheap to share across tasks behind an `Arc`; once the key set cache is
/// warm, no lock serializes unrelated verifications.
///
/// # Example
///
/// ```rust,no_run
/// # use poolguard::{PoolConfig, TokenVerifier};
/// # tokio_test::block_on(async {
/// let config = PoolConfig::new("us-east-1", "us-east-1_ExAmPlE")?;
/// let verifier = TokenVerifier::new(config);
///
/// match verifier.verify("eyJraWQiOi...").await.into_claims() {
///     Ok(claims) => println!("access granted to {}", claims.sub),
///     Err(reason) => eprintln!("rejected: {reason}"),
/// }
/// # Ok::<(), poolguard::ConfigError>(())
/// # });
/// ```
pub struct TokenVerifier {
    /// Expected issuer and JWKS location
    config: PoolConfig,
    /// Where verification keys come from
    key_source: Arc<dyn KeySource>,
    /// Single clock read per verification
    clock: Arc<dyn Clock>,
    /// Audit trail for every attempt and outcome
    audit: AuditLog,
    /// Allowed signature algorithms (default: RS256, what Cognito signs with)
    allowed_algorithms: Vec<Algorithm>,
}

// Manual Debug impl: trait objects have no Debug of their own
impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("config", &self.config)
            .field("allowed_algorithms", &self.allowed_algorithms)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Create a verifier backed by a [`KeySetCache`] on the pool's JWKS URL.
    pub fn new(config: PoolConfig) -> Self {
        let cache = KeySetCache::new(config.jwks_url());
        Self::with_key_source(config, Arc::new(cache))
    }

    /// Create a verifier with a custom key source.
    ///
    /// Use this to share one cache between verifiers, or to substitute a fake
    /// IdP in tests.
    pub fn with_key_source(config: PoolConfig, key_source: Arc<dyn KeySource>) -> Self {
        Self {
            config,
            key_source,
            clock: Arc::new(SystemClock),
            audit: AuditLog::default(),
            allowed_algorithms: vec![Algorithm::RS256],
        }
    }

    /// Replace the clock used for the temporal checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the allowed signature algorithms.
    ///
    /// Never include a symmetric algorithm here: the verification keys are
    /// public, so anyone could mint a "valid" HS256 token against them.
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.allowed_algorithms = algorithms;
        self
    }

    /// Replace the audit log.
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    /// The pool configuration this verifier trusts.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Verify a raw token and return a structured trust decision.
    ///
    /// Emits an audit entry for the attempt and one for the outcome; neither
    /// contains token material or key contents.
    pub async fn verify(&self, token: &str) -> Verification {
        self.audit.log(VerifyEvent::Attempt);

        match self.check(token).await {
            Ok(claims) => {
                debug!(subject = %claims.sub, "Claim confirmed");
                self.audit.log(VerifyEvent::Confirmed {
                    sub: claims.sub.clone(),
                    username: claims.username.clone(),
                });
                Verification::Valid(claims)
            }
            Err(err) => {
                self.audit.log(VerifyEvent::Rejected {
                    kind: err.kind(),
                    detail: err.to_string(),
                });
                Verification::Invalid(err)
            }
        }
    }

    /// The fallible pipeline behind [`TokenVerifier::verify`].
    async fn check(&self, token: &str) -> Result<AccessClaims, VerifyError> {
        // Segment check runs before any key-source access, so malformed
        // tokens never trigger a JWKS fetch.
        if token.split('.').count() < 2 {
            return Err(VerifyError::MalformedToken);
        }

        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "Failed to decode token header");
            VerifyError::MalformedToken
        })?;

        // A header without a kid references no published key.
        let kid = header.kid.clone().unwrap_or_default();
        if kid.is_empty() {
            return Err(VerifyError::UnknownSigningKey { kid });
        }

        // Algorithm allowlist before any cryptography, against
        // algorithm-confusion tokens (none, HS256 with a public key).
        if !self.allowed_algorithms.contains(&header.alg) {
            warn!(
                algorithm = ?header.alg,
                allowed = ?self.allowed_algorithms,
                "Token algorithm not allowed"
            );
            return Err(VerifyError::SignatureInvalid);
        }

        let keys = self.key_source.keys().await?;
        let key = keys
            .get(&kid)
            .ok_or_else(|| VerifyError::UnknownSigningKey { kid: kid.clone() })?;

        // Signature verification only: the temporal and issuer policy below
        // owns exp/auth_time/iss decisions against the injected clock.
        let mut validation = Validation::new(header.alg);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data: TokenData<AccessClaims> = decode(token, key.decoding_key(), &validation)
            .map_err(|e| {
                debug!(kid = %kid, error = %e, "Token verification failed");
                map_decode_error(&e)
            })?;
        let claims = token_data.claims;

        // Single clock read for both bounds; the boundary instants
        // now == exp and now == auth_time are accepted.
        let now = self.clock.now_secs();
        if now > claims.exp {
            return Err(VerifyError::ClaimExpired {
                detail: "expiration time has passed",
            });
        }
        if now < claims.auth_time {
            return Err(VerifyError::ClaimExpired {
                detail: "authentication time is in the future",
            });
        }

        if claims.iss != self.config.issuer() {
            return Err(VerifyError::IssuerMismatch {
                expected: self.config.issuer().to_string(),
                found: claims.iss.clone(),
            });
        }

        if claims.token_use != EXPECTED_TOKEN_USE {
            return Err(VerifyError::WrongTokenUse {
                found: claims.token_use.clone(),
            });
        }

        Ok(claims)
    }
}

/// Map `jsonwebtoken` decode failures onto the rejection taxonomy.
///
/// Structural failures in the payload are malformed tokens; everything
/// cryptographic, including algorithm mismatches, is a signature failure.
fn map_decode_error(err: &jsonwebtoken::errors::Error) -> VerifyError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => VerifyError::MalformedToken,
        _ => VerifyError::SignatureInvalid,
    }
}

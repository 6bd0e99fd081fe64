//! # Poolguard - Cognito user-pool access-token verification
//!
//! Validates bearer access tokens issued by an AWS Cognito user pool (or any
//! compatible identity provider that publishes its signing keys as a JWKS
//! document). Given an opaque token string, the verifier checks the signature
//! against the pool's published public keys, applies the temporal and identity
//! claim policy, and returns a structured trust decision.
//!
//! ## Architecture
//!
//! ```text
//! caller ──► TokenVerifier::verify(token)
//!                 │
//!                 ├──► KeySource::keys()          (KeySetCache: fetch once, serve from memory)
//!                 ├──► signature verification     (jsonwebtoken, RS256 by default)
//!                 └──► claim policy               (exp / auth_time / iss / token_use)
//! ```
//!
//! - [`jwks`] - JWKS fetching and the populate-once key set cache
//! - [`verifier`] - token verification pipeline and the [`Verification`] result
//! - [`config`] - pool configuration and issuer/JWKS URL derivation
//! - [`claims`] - decoded access-token claim set
//! - [`error`] - rejection taxonomy
//! - [`clock`] - injectable time source for deterministic temporal checks
//! - [`audit`] - structured audit logging for verification events
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use poolguard::{PoolConfig, TokenVerifier};
//!
//! # tokio_test::block_on(async {
//! let config = PoolConfig::new("us-east-1", "us-east-1_ExAmPlE")?;
//! let verifier = TokenVerifier::new(config);
//!
//! let result = verifier.verify("eyJraWQiOi...").await;
//! if let Some(claims) = result.claims() {
//!     println!("access granted to {}", claims.sub);
//! }
//! # Ok::<(), poolguard::ConfigError>(())
//! # });
//! ```
//!
//! ## Trust invariant
//!
//! A [`Verification::Valid`] result is only produced when all of the following
//! hold: the signature matches a key the cache attributes to the pool, the
//! token is neither expired nor earlier than its `auth_time`, the `iss` claim
//! equals the configured issuer exactly, and `token_use` is `"access"`.
//! Every failure, including an unreachable JWKS endpoint, is recovered into
//! [`Verification::Invalid`] so callers always receive a structured outcome.
//!
//! ## Key rotation
//!
//! The key set cache is populated once per process lifetime and never
//! refreshed. A key rotated by the IdP after population is not picked up
//! until the process (or the verifier) is recreated; tokens signed with the
//! new key are rejected as [`VerifyError::UnknownSigningKey`]. This is a
//! deliberate simplicity/staleness trade-off.

pub mod audit;
pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod jwks;
pub mod verifier;

pub use audit::{AuditLog, AuditRecord, VerifyEvent};
pub use claims::AccessClaims;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, PoolConfig};
pub use error::{RejectKind, VerifyError};
pub use jwks::{KeyMap, KeySetCache, KeySource, VerificationKey};
pub use verifier::{TokenVerifier, Verification};

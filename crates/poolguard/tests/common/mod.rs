//! Common test utilities for verifier integration tests
//!
//! Provides a wiremock-backed fake identity provider serving a JWKS document,
//! plus RSA keypair generation and token minting helpers.

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use poolguard::PoolConfig;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use serde_json::json;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// RSA keypair with the public half pre-encoded as JWK parameters.
pub struct TestKeypair {
    pub private_pem: Vec<u8>,
    /// base64url modulus
    pub n: String,
    /// base64url exponent
    pub e: String,
}

fn generate_keypair() -> TestKeypair {
    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate RSA key");
    let public_key = private_key.to_public_key();

    let private_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .expect("Failed to encode private key")
        .as_bytes()
        .to_vec();

    TestKeypair {
        private_pem,
        n: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
        e: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
    }
}

/// Process-wide signing keypair (RSA generation is slow, share it).
pub fn pool_keypair() -> &'static TestKeypair {
    static KEYPAIR: OnceLock<TestKeypair> = OnceLock::new();
    KEYPAIR.get_or_init(generate_keypair)
}

/// A second keypair the fake IdP never publishes, for wrong-key tokens.
pub fn rogue_keypair() -> &'static TestKeypair {
    static KEYPAIR: OnceLock<TestKeypair> = OnceLock::new();
    KEYPAIR.get_or_init(generate_keypair)
}

/// JWKS entry for a keypair under the given kid.
pub fn jwk_for(kid: &str, keypair: &TestKeypair) -> serde_json::Value {
    json!({
        "kty": "RSA",
        "kid": kid,
        "use": "sig",
        "alg": "RS256",
        "n": keypair.n,
        "e": keypair.e,
    })
}

/// Fake identity provider serving `/test-pool/.well-known/jwks.json`.
pub struct MockIdp {
    pub server: MockServer,
    pub config: PoolConfig,
}

impl MockIdp {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let issuer = format!("{}/test-pool", server.uri());
        let jwks_url = format!("{issuer}/.well-known/jwks.json");
        let config = PoolConfig::with_issuer(issuer, jwks_url).expect("valid mock issuer");

        Self { server, config }
    }

    pub fn issuer(&self) -> &str {
        self.config.issuer()
    }

    /// Serve the given keys, asserting the exact number of fetches on drop.
    pub async fn mount_jwks(&self, keys: Vec<serde_json::Value>, expected_fetches: u64) {
        Mock::given(method("GET"))
            .and(path("/test-pool/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
            .expect(expected_fetches)
            .mount(&self.server)
            .await;
    }

    /// Serve an error status from the JWKS endpoint.
    pub async fn mount_jwks_error(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/test-pool/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Serve a body that is not a JWKS document.
    pub async fn mount_jwks_garbage(&self) {
        Mock::given(method("GET"))
            .and(path("/test-pool/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not a key set"))
            .mount(&self.server)
            .await;
    }
}

/// Mint an RS256 token with the given kid and claims.
pub fn mint_token(kid: &str, keypair: &TestKeypair, claims: &serde_json::Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());

    let key = EncodingKey::from_rsa_pem(&keypair.private_pem).expect("Invalid RSA key");
    encode(&header, claims, &key).expect("Failed to encode test token")
}

/// Mint an HS256 token, for algorithm-confusion tests.
pub fn mint_hs256_token(kid: &str, claims: &serde_json::Value) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());

    encode(&header, claims, &EncodingKey::from_secret(b"shared-secret"))
        .expect("Failed to encode test token")
}

/// Get current Unix timestamp.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Well-formed access-token claims: unexpired, authenticated 10s ago.
pub fn access_claims(issuer: &str, now: u64) -> serde_json::Value {
    json!({
        "sub": "u1",
        "iss": issuer,
        "token_use": "access",
        "exp": now + 3600,
        "auth_time": now - 10,
        "username": "alice",
        "client_id": "client-1",
        "scope": "aws.cognito.signin.user.admin",
        "iat": now - 10,
        "jti": "11111111-1111-1111-1111-111111111111",
    })
}

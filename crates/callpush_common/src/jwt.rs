//! JWT assertions for provider authentication.
//!
//! Two kinds of token are minted here:
//!
//! - the RS256 service-account assertion that is exchanged at Google's OAuth2
//!   endpoint for an FCM access token, and
//! - the ES256 provider token that APNs accepts directly as a bearer token.
//!
//! Both are three base64url segments (`header.payload.signature`), encoded
//! without padding. The signature covers the ASCII bytes of
//! `header.payload`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{crypto, Algorithm, EncodingKey};
use serde::Serialize;
use std::fmt;

use crate::error::{crypto_error, CallpushError};
use crate::models::ServiceAccountCredentials;

/// Audience of the OAuth assertion. Fixed by Google, independent of where the
/// exchange request is actually sent.
pub const OAUTH_TOKEN_AUDIENCE: &str = "https://oauth2.googleapis.com/token";

/// OAuth scope for the FCM HTTP v1 API.
pub const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Lifetime declared in the OAuth assertion's `exp` claim.
pub const OAUTH_ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Base64url without padding.
pub fn base64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

pub fn base64url_decode(data: &str) -> Result<Vec<u8>, CallpushError> {
    URL_SAFE_NO_PAD
        .decode(data)
        .map_err(|e| crypto_error(format!("invalid base64url: {e}")))
}

/// A signed JWT, kept as its three encoded segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtAssertion {
    pub header: String,
    pub payload: String,
    pub signature: String,
}

impl JwtAssertion {
    fn sign<H: Serialize, C: Serialize>(
        header: &H,
        claims: &C,
        key: &EncodingKey,
        algorithm: Algorithm,
    ) -> Result<Self, CallpushError> {
        let header = encode_segment(header)?;
        let payload = encode_segment(claims)?;
        let signing_input = format!("{header}.{payload}");

        // `crypto::sign` already returns the signature bytes base64url-encoded.
        let signature = crypto::sign(signing_input.as_bytes(), key, algorithm)
            .map_err(|e| crypto_error(format!("failed to sign JWT: {e}")))?;

        Ok(Self {
            header,
            payload,
            signature,
        })
    }

    /// The bytes the signature covers.
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }

    /// The compact `header.payload.signature` form.
    pub fn compact(&self) -> String {
        format!("{}.{}.{}", self.header, self.payload, self.signature)
    }
}

impl fmt::Display for JwtAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compact())
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, CallpushError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| crypto_error(format!("failed to serialize JWT segment: {e}")))?;
    Ok(base64url_encode(&json))
}

#[derive(Debug, Serialize)]
struct OAuthHeader {
    alg: &'static str,
    typ: &'static str,
}

/// Claims of the service-account assertion.
#[derive(Debug, Serialize)]
pub struct OAuthClaims<'a> {
    pub iss: &'a str,
    pub scope: &'a str,
    pub aud: &'a str,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Serialize)]
struct ApnsHeader<'a> {
    alg: &'static str,
    kid: &'a str,
}

/// Claims of the APNs provider token.
#[derive(Debug, Serialize)]
pub struct ApnsClaims<'a> {
    pub iss: &'a str,
    pub iat: i64,
}

/// Builds and signs JWT assertions.
#[derive(Debug, Clone)]
pub struct TokenMinter {
    oauth_scope: String,
}

impl Default for TokenMinter {
    fn default() -> Self {
        Self::new(FCM_SCOPE)
    }
}

impl TokenMinter {
    /// Creates a minter that requests `oauth_scope` in OAuth assertions.
    pub fn new(oauth_scope: impl Into<String>) -> Self {
        Self {
            oauth_scope: oauth_scope.into(),
        }
    }

    pub fn oauth_scope(&self) -> &str {
        &self.oauth_scope
    }

    /// Mints the RS256 assertion for the OAuth2 JWT-bearer grant.
    ///
    /// Header `{alg: RS256, typ: JWT}`; claims `iss` (service account email),
    /// `scope`, `aud` (Google token endpoint), `iat = now`,
    /// `exp = now + 3600`.
    ///
    /// # Errors
    ///
    /// `CryptoError` if the private key is not a usable RSA PEM or signing fails.
    pub fn mint_oauth_assertion(
        &self,
        creds: &ServiceAccountCredentials,
        now: i64,
    ) -> Result<JwtAssertion, CallpushError> {
        let key = EncodingKey::from_rsa_pem(creds.private_key().as_bytes())
            .map_err(|e| crypto_error(format!("failed to parse service account key: {e}")))?;

        let header = OAuthHeader {
            alg: "RS256",
            typ: "JWT",
        };
        let claims = OAuthClaims {
            iss: creds.client_email(),
            scope: &self.oauth_scope,
            aud: OAUTH_TOKEN_AUDIENCE,
            exp: now + OAUTH_ASSERTION_LIFETIME_SECS,
            iat: now,
        };

        JwtAssertion::sign(&header, &claims, &key, Algorithm::RS256)
    }

    /// Mints the ES256 provider token for APNs.
    ///
    /// Header `{alg: ES256, kid}`; claims `iss` (team id) and `iat = now`.
    ///
    /// # Errors
    ///
    /// `CryptoError` if `key_pem` is not a PKCS#8 EC P-256 key or signing fails.
    pub fn mint_apns_assertion(
        key_pem: &str,
        key_id: &str,
        team_id: &str,
        now: i64,
    ) -> Result<JwtAssertion, CallpushError> {
        let key = EncodingKey::from_ec_pem(key_pem.as_bytes())
            .map_err(|e| crypto_error(format!("failed to parse APNs key: {e}")))?;

        let header = ApnsHeader {
            alg: "ES256",
            kid: key_id,
        };
        let claims = ApnsClaims {
            iss: team_id,
            iat: now,
        };

        JwtAssertion::sign(&header, &claims, &key, Algorithm::ES256)
    }
}

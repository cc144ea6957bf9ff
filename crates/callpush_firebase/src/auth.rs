//! OAuth2 access tokens for Firebase Cloud Messaging.
//!
//! A cached token is reused while it is valid. Otherwise a service-account
//! assertion is minted and exchanged at the token endpoint with the
//! JWT-bearer grant, and the result is written back to the cache.

use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use callpush_common::error::{auth_error, CallpushError};
use callpush_common::http::client::post_json;
use callpush_common::jwt::TokenMinter;
use callpush_common::models::{CachedAccessToken, ServiceAccountCredentials};
use callpush_config::FirebaseConfig;

use crate::credentials::CredentialStore;

pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime written to the cache. Shorter than the assertion's 3600 seconds
/// to leave room for clock skew and request latency.
pub const CACHE_LIFETIME_SECS: i64 = 3500;

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    assertion: &'a str,
}

#[derive(Debug, Clone)]
pub struct AccessTokenProvider {
    credentials: CredentialStore,
    minter: TokenMinter,
    client: Client,
    token_uri: String,
}

impl AccessTokenProvider {
    pub fn new(
        credentials: CredentialStore,
        minter: TokenMinter,
        client: Client,
        token_uri: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            minter,
            client,
            token_uri: token_uri.into(),
        }
    }

    pub fn from_config(credentials: CredentialStore, client: Client, config: &FirebaseConfig) -> Self {
        Self::new(
            credentials,
            TokenMinter::new(config.oauth_scope.clone()),
            client,
            config.token_uri.clone(),
        )
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Returns a usable access token for `creds`.
    pub async fn get_access_token(
        &self,
        creds: &ServiceAccountCredentials,
    ) -> Result<String, CallpushError> {
        self.get_access_token_at(creds, Utc::now().timestamp()).await
    }

    /// [`get_access_token`](Self::get_access_token) with an explicit clock.
    ///
    /// # Errors
    ///
    /// - `CryptoError` if the assertion cannot be signed
    /// - `TransportError` if the exchange fails or returns a non-2xx status
    /// - `AuthError` if the exchange reply carries no `access_token`
    pub async fn get_access_token_at(
        &self,
        creds: &ServiceAccountCredentials,
        now: i64,
    ) -> Result<String, CallpushError> {
        if let Some(cached) = self.credentials.read_cached_token().await {
            if cached.is_valid_at(now) {
                debug!("Using cached access token (expires at {})", cached.expires_at);
                return Ok(cached.access_token);
            }
        }

        let assertion = self.minter.mint_oauth_assertion(creds, now)?;
        let access_token = self.exchange(&assertion.compact()).await?;

        let cached = CachedAccessToken {
            access_token: access_token.clone(),
            expires_at: now + CACHE_LIFETIME_SECS,
        };
        if let Err(e) = self.credentials.write_cached_token(&cached).await {
            warn!("Failed to persist access token: {}", e);
        }

        info!("Obtained new access token for {}", creds.client_email());
        Ok(access_token)
    }

    async fn exchange(&self, assertion: &str) -> Result<String, CallpushError> {
        let request = TokenRequest {
            grant_type: JWT_BEARER_GRANT,
            assertion,
        };

        let reply = post_json(&self.client, &self.token_uri, &[], &request)
            .await?
            .error_for_status()?;

        reply
            .json()
            .as_ref()
            .and_then(|body| body.get("access_token"))
            .and_then(|token| token.as_str())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| auth_error("Failed to obtain access token."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callpush_common::store::MemoryBlobStore;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSA_PRIVATE: &str = include_str!("../../callpush_common/testdata/rsa_private.pem");
    const NOW: i64 = 1_700_000_000;

    fn creds() -> ServiceAccountCredentials {
        ServiceAccountCredentials::new("push@p.iam.gserviceaccount.com", RSA_PRIVATE, "p").unwrap()
    }

    fn provider(memory: Arc<MemoryBlobStore>, server: &MockServer) -> AccessTokenProvider {
        AccessTokenProvider::new(
            CredentialStore::new(memory, "sa.json", "token.json"),
            TokenMinter::default(),
            Client::new(),
            format!("{}/token", server.uri()),
        )
    }

    async fn seed_cache(memory: &MemoryBlobStore, token: &str, expires_at: i64) {
        let body = json!({"access_token": token, "expires_at": expires_at}).to_string();
        memory.insert("token.json", body).await;
    }

    #[tokio::test]
    async fn test_valid_cache_makes_no_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let memory = Arc::new(MemoryBlobStore::new());
        seed_cache(&memory, "cached-token", NOW + 60).await;

        let token = provider(memory, &server)
            .get_access_token_at(&creds(), NOW)
            .await
            .unwrap();
        assert_eq!(token, "cached-token");
    }

    #[tokio::test]
    async fn test_expired_cache_exchanges_once_and_persists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_partial_json(json!({"grant_type": JWT_BEARER_GRANT})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "fresh", "expires_in": 3599})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let memory = Arc::new(MemoryBlobStore::new());
        seed_cache(&memory, "stale", NOW - 1).await;

        let token = provider(memory.clone(), &server)
            .get_access_token_at(&creds(), NOW)
            .await
            .unwrap();
        assert_eq!(token, "fresh");

        let cached: CachedAccessToken =
            serde_json::from_str(&memory.get_string("token.json").await.unwrap()).unwrap();
        assert_eq!(
            cached,
            CachedAccessToken {
                access_token: "fresh".into(),
                expires_at: NOW + CACHE_LIFETIME_SECS,
            }
        );
    }

    #[tokio::test]
    async fn test_assertion_is_sent_in_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t"})))
            .expect(1)
            .mount(&server)
            .await;

        provider(Arc::new(MemoryBlobStore::new()), &server)
            .get_access_token_at(&creds(), NOW)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let assertion = body["assertion"].as_str().unwrap();
        assert_eq!(assertion.split('.').count(), 3);
        assert_eq!(body["grant_type"], JWT_BEARER_GRANT);
    }

    #[tokio::test]
    async fn test_empty_cached_token_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "new"})))
            .expect(1)
            .mount(&server)
            .await;

        let memory = Arc::new(MemoryBlobStore::new());
        seed_cache(&memory, "", NOW + 600).await;

        let token = provider(memory, &server)
            .get_access_token_at(&creds(), NOW)
            .await
            .unwrap();
        assert_eq!(token, "new");
    }

    #[tokio::test]
    async fn test_missing_access_token_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "Bearer"})))
            .mount(&server)
            .await;

        let memory = Arc::new(MemoryBlobStore::new());
        let err = provider(memory.clone(), &server)
            .get_access_token_at(&creds(), NOW)
            .await
            .unwrap_err();

        assert!(matches!(err, CallpushError::AuthError(_)));
        assert!(memory.get_string("token.json").await.is_none());
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
            )
            .mount(&server)
            .await;

        let err = provider(Arc::new(MemoryBlobStore::new()), &server)
            .get_access_token_at(&creds(), NOW)
            .await
            .unwrap_err();

        match err {
            CallpushError::TransportError(message) => assert!(message.contains("invalid_grant")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

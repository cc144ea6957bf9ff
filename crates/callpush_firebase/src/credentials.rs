//! Persisted Firebase credential state.
//!
//! Two blobs: the service account JSON, provisioned out-of-band and never
//! written here, and the single OAuth access token cache slot.

use std::sync::Arc;
use tracing::{debug, warn};

use callpush_common::error::{config_error, CallpushError};
use callpush_common::models::{CachedAccessToken, ServiceAccountCredentials};
use callpush_common::store::BlobStore;
use callpush_config::StorageConfig;

#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn BlobStore>,
    service_account_key: String,
    token_cache_key: String,
}

impl CredentialStore {
    pub fn new(
        store: Arc<dyn BlobStore>,
        service_account_key: impl Into<String>,
        token_cache_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            service_account_key: service_account_key.into(),
            token_cache_key: token_cache_key.into(),
        }
    }

    pub fn from_config(store: Arc<dyn BlobStore>, storage: &StorageConfig) -> Self {
        Self::new(
            store,
            storage.service_account_file.clone(),
            storage.token_cache_file.clone(),
        )
    }

    /// Reads and validates the service account JSON.
    ///
    /// # Errors
    ///
    /// `ConfigError` if the blob is absent, not JSON, or lacks one of
    /// `client_email`, `private_key`, `project_id`.
    pub async fn load_service_account(&self) -> Result<ServiceAccountCredentials, CallpushError> {
        let data = self
            .store
            .read(&self.service_account_key)
            .await?
            .ok_or_else(|| config_error("Service account JSON file not found."))?;

        ServiceAccountCredentials::from_json(&data)
    }

    /// The cached token, if there is one that parses. Never fails; storage
    /// errors are logged and treated as a cache miss.
    pub async fn read_cached_token(&self) -> Option<CachedAccessToken> {
        let data = match self.store.read(&self.token_cache_key).await {
            Ok(Some(data)) => data,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read token cache {}: {}", self.token_cache_key, e);
                return None;
            }
        };

        match serde_json::from_slice(&data) {
            Ok(token) => Some(token),
            Err(e) => {
                debug!("Ignoring unparsable token cache: {}", e);
                None
            }
        }
    }

    /// Overwrites the single cache slot.
    ///
    /// There is no locking: two invocations that both find the cache expired
    /// will both mint a token and the last write wins. Tokens are
    /// interchangeable and short-lived, so either result is usable. The slot is
    /// not keyed by service account; only one account may be in use per store.
    pub async fn write_cached_token(&self, token: &CachedAccessToken) -> Result<(), CallpushError> {
        let data = serde_json::to_vec(token)
            .map_err(|e| config_error(format!("failed to serialize token cache: {e}")))?;
        self.store.write(&self.token_cache_key, &data).await
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("service_account_key", &self.service_account_key)
            .field("token_cache_key", &self.token_cache_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callpush_common::store::MemoryBlobStore;

    fn store_with(memory: Arc<MemoryBlobStore>) -> CredentialStore {
        CredentialStore::new(memory, "service-account.json", "token.json")
    }

    #[tokio::test]
    async fn test_missing_service_account_is_config_error() {
        let credentials = store_with(Arc::new(MemoryBlobStore::new()));

        let err = credentials.load_service_account().await.unwrap_err();
        match err {
            CallpushError::ConfigError(message) => {
                assert_eq!(message, "Service account JSON file not found.")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_service_account() {
        let memory = Arc::new(MemoryBlobStore::new());
        memory
            .insert(
                "service-account.json",
                r#"{"client_email":"e@p.iam","private_key":"pem","project_id":"p"}"#,
            )
            .await;

        let creds = store_with(memory).load_service_account().await.unwrap();
        assert_eq!(creds.project_id(), "p");
    }

    #[tokio::test]
    async fn test_cached_token_roundtrip_and_overwrite() {
        let memory = Arc::new(MemoryBlobStore::new());
        let credentials = store_with(memory.clone());
        assert!(credentials.read_cached_token().await.is_none());

        let first = CachedAccessToken {
            access_token: "one".into(),
            expires_at: 10,
        };
        let second = CachedAccessToken {
            access_token: "two".into(),
            expires_at: 20,
        };
        credentials.write_cached_token(&first).await.unwrap();
        credentials.write_cached_token(&second).await.unwrap();

        assert_eq!(credentials.read_cached_token().await, Some(second));
        let raw: serde_json::Value =
            serde_json::from_str(&memory.get_string("token.json").await.unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"access_token": "two", "expires_at": 20}));
    }

    #[tokio::test]
    async fn test_unparsable_cache_is_a_miss() {
        let memory = Arc::new(MemoryBlobStore::new());
        memory.insert("token.json", "{not json").await;

        assert!(store_with(memory).read_cached_token().await.is_none());
    }
}

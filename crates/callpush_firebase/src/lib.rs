//! Firebase Cloud Messaging delivery for callpush
//!
//! - [`CredentialStore`]: service account JSON and the access token cache slot
//! - [`AccessTokenProvider`]: cache-or-exchange OAuth2 access tokens
//! - [`FcmDispatcher`]: HTTP v1 `messages:send` in the data or alert shape
//!
//! # Example
//!
//! ```rust,no_run
//! use callpush_common::{FileBlobStore, ServiceAccountCredentials};
//! use callpush_firebase::{AccessTokenProvider, CredentialStore, FcmDispatcher, FcmVariant};
//! use callpush_config::AppConfig;
//! use std::sync::Arc;
//!
//! async fn notify() -> Result<(), callpush_common::CallpushError> {
//!     let config = AppConfig::default();
//!     let store = Arc::new(FileBlobStore::new(&config.storage.data_dir));
//!     let client = callpush_common::client_from_config(&config.http)?;
//!
//!     let credentials = CredentialStore::from_config(store, &config.storage);
//!     let creds = credentials.load_service_account().await?;
//!     let tokens = AccessTokenProvider::from_config(credentials, client.clone(), &config.firebase);
//!     let access_token = tokens.get_access_token(&creds).await?;
//!
//!     let data = serde_json::json!({"type": "call", "call_id": "c-1"});
//!     FcmDispatcher::from_config(client, &config.firebase)
//!         .send(&access_token, "device-token", creds.project_id(), &data, &FcmVariant::Data)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod credentials;

pub use auth::AccessTokenProvider;
pub use client::{FcmDispatcher, FcmVariant};
pub use credentials::CredentialStore;

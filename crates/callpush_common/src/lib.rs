// --- File: crates/callpush_common/src/lib.rs ---

pub mod error; // Error taxonomy
pub mod event_log; // Append-only event log
pub mod http; // HTTP client helpers and error responses
pub mod jwt; // JWT minting for OAuth and APNs
pub mod logging; // Logging utilities
pub mod models; // Shared data structures
pub mod store; // Blob storage

mod jwt_test;

pub use error::{
    auth_error, config_error, crypto_error, delivery_error, transport_error, validation_error,
    CallpushError, HttpStatusCode, Result,
};

pub use event_log::EventLog;

pub use http::{
    client::{client_from_config, create_client, create_http2_client, post_json, HttpReply},
    IntoHttpResponse,
};

pub use jwt::{JwtAssertion, TokenMinter, FCM_SCOPE, OAUTH_TOKEN_AUDIENCE};

pub use logging::{init, init_with_file, init_with_level, log_error, log_result, redact_token};

pub use models::{CachedAccessToken, DeliveryPath, NotificationOutcome, ServiceAccountCredentials};

pub use store::{BlobStore, FileBlobStore, MemoryBlobStore};

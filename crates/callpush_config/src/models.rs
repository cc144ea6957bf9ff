// --- File: crates/callpush_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

// --- Outbound HTTP Config ---
// Every provider call (OAuth exchange, FCM, APNs) is bounded by these timeouts.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// --- Storage Config ---
// File names are keys inside `data_dir`. The service account file is provisioned
// out-of-band and only ever read.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_service_account_file")]
    pub service_account_file: String,
    #[serde(default = "default_token_cache_file")]
    pub token_cache_file: String,
    #[serde(default = "default_event_log_file")]
    pub event_log_file: String,
    /// IANA timezone used for event log timestamps.
    #[serde(default = "default_log_timezone")]
    pub log_timezone: String,
}

fn default_data_dir() -> String {
    ".".to_string()
}

fn default_service_account_file() -> String {
    "service-account.json".to_string()
}

fn default_token_cache_file() -> String {
    "fcm_access_token.json".to_string()
}

fn default_event_log_file() -> String {
    "fcm_log.txt".to_string()
}

fn default_log_timezone() -> String {
    "Asia/Dhaka".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            service_account_file: default_service_account_file(),
            token_cache_file: default_token_cache_file(),
            event_log_file: default_event_log_file(),
            log_timezone: default_log_timezone(),
        }
    }
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write daily-rotated log files here when set.
    #[serde(default)]
    pub dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

/// Which FCM payload shape non-VoIP requests are sent with.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FcmMode {
    /// Silent data message with `content-available: 1`.
    #[default]
    Data,
    /// Legacy shape: visible `notification` block plus an APNs alert.
    Alert,
}

// --- Firebase Config ---
// Service account credentials are not part of this struct; they are read from
// the blob named by `StorageConfig::service_account_file`.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FirebaseConfig {
    #[serde(default = "default_oauth_scope")]
    pub oauth_scope: String,
    /// Where the signed assertion is POSTed. The assertion audience is always
    /// Google's token endpoint, whatever this is set to.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default = "default_fcm_base_url")]
    pub fcm_base_url: String,
    #[serde(default)]
    pub mode: FcmMode,
}

fn default_oauth_scope() -> String {
    "https://www.googleapis.com/auth/firebase.messaging".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_fcm_base_url() -> String {
    "https://fcm.googleapis.com".to_string()
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            oauth_scope: default_oauth_scope(),
            token_uri: default_token_uri(),
            fcm_base_url: default_fcm_base_url(),
            mode: FcmMode::default(),
        }
    }
}

// --- APNs Config ---
// Token-based provider auth. The .p8 key is either inlined (usually via
// "secret_from_env") or read from `private_key_path`.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApnsConfig {
    pub key_id: String,    // Mandatory
    pub team_id: String,   // Mandatory
    pub bundle_id: String, // Mandatory, sent as apns-topic
    #[serde(default = "default_apns_host")]
    pub host: String,
    #[serde(default)]
    pub private_key_path: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
}

fn default_apns_host() -> String {
    "api.push.apple.com".to_string()
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_apns: bool,

    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub firebase: FirebaseConfig,

    // --- Optional Provider Configurations ---
    #[serde(default)]
    pub apns: Option<ApnsConfig>,
}

impl AppConfig {
    /// Returns the APNs section only when VoIP delivery is switched on.
    pub fn active_apns(&self) -> Option<&ApnsConfig> {
        if self.use_apns {
            self.apns.as_ref()
        } else {
            None
        }
    }
}

//! APNs VoIP client.
//!
//! VoIP pushes go straight to Apple over HTTP/2 with a token-based (ES256)
//! provider JWT. The body is the call data as-is, without an `aps` wrapper.

use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use callpush_common::error::{config_error, delivery_error, CallpushError};
use callpush_common::http::client::{create_http2_client, post_json};
use callpush_common::jwt::TokenMinter;
use callpush_common::logging::redact_token;
use callpush_common::models::{DeliveryPath, NotificationOutcome};
use callpush_config::env_vars::{secret_path_to_env_var, SECRET_MARKER};
use callpush_config::{ApnsConfig, HttpConfig};

pub const PUSH_TYPE_VOIP: &str = "voip";
pub const PRIORITY_IMMEDIATE: &str = "10";

#[derive(Clone)]
pub struct ApnsVoipDispatcher {
    client: Client,
    base_url: String,
    key_pem: String,
    key_id: String,
    team_id: String,
    bundle_id: String,
}

/// Reads the .p8 key, preferring the inline value over the file.
fn load_private_key(config: &ApnsConfig) -> Result<String, CallpushError> {
    if let Some(key) = config.private_key.as_deref().filter(|k| !k.trim().is_empty()) {
        // Left in place when the secret's environment variable is unset.
        if key.trim() == SECRET_MARKER {
            return Err(config_error(format!(
                "APNs private_key is {SECRET_MARKER} but {} is not set",
                secret_path_to_env_var("apns.private_key")
            )));
        }
        return Ok(key.to_string());
    }

    match config.private_key_path.as_deref() {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| config_error(format!("failed to read APNs key {path}: {e}"))),
        None => Err(config_error(
            "APNs requires either private_key or private_key_path",
        )),
    }
}

impl ApnsVoipDispatcher {
    /// Builds a dispatcher with its own HTTP/2 client.
    ///
    /// # Errors
    ///
    /// `ConfigError` if no key is configured, the inline key is still the
    /// unresolved secret marker, or the key file cannot be read.
    pub fn new(config: &ApnsConfig, http: &HttpConfig) -> Result<Self, CallpushError> {
        let key_pem = load_private_key(config)?;
        let client = create_http2_client(http.connect_timeout_secs, http.timeout_secs)?;

        Ok(Self {
            client,
            base_url: format!("https://{}", config.host),
            key_pem,
            key_id: config.key_id.clone(),
            team_id: config.team_id.clone(),
            bundle_id: config.bundle_id.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn device_url(&self, device_token: &str) -> String {
        format!("{}/3/device/{}", self.base_url, device_token)
    }

    pub async fn send(
        &self,
        device_token: &str,
        data: &Value,
    ) -> Result<NotificationOutcome, CallpushError> {
        self.send_at(device_token, data, Utc::now().timestamp()).await
    }

    /// Sends one VoIP push, signing the provider token at `now`.
    ///
    /// # Errors
    ///
    /// - `CryptoError` if the key cannot sign
    /// - `TransportError` if the request cannot be completed
    /// - `DeliveryError` with the reply body for any status other than 200
    pub async fn send_at(
        &self,
        device_token: &str,
        data: &Value,
        now: i64,
    ) -> Result<NotificationOutcome, CallpushError> {
        let jwt = TokenMinter::mint_apns_assertion(&self.key_pem, &self.key_id, &self.team_id, now)?;
        let authorization = format!("bearer {jwt}");

        debug!("Sending APNs VoIP push to {}", redact_token(device_token));

        let reply = post_json(
            &self.client,
            &self.device_url(device_token),
            &[
                ("authorization", authorization.as_str()),
                ("apns-topic", self.bundle_id.as_str()),
                ("apns-push-type", PUSH_TYPE_VOIP),
                ("apns-priority", PRIORITY_IMMEDIATE),
            ],
            data,
        )
        .await?;

        if reply.status != reqwest::StatusCode::OK {
            warn!("APNs rejected VoIP push with status {}", reply.status);
            if reply.body.trim().is_empty() {
                return Err(delivery_error("apns", format!("HTTP {}", reply.status)));
            }
            return Err(delivery_error("apns", reply.body));
        }

        let apns_id = reply.header("apns-id").map(str::to_string);
        info!(
            "APNs accepted VoIP push{}",
            apns_id
                .as_deref()
                .map(|id| format!(" {id}"))
                .unwrap_or_default()
        );
        Ok(NotificationOutcome::delivered(DeliveryPath::ApnsVoip, apns_id))
    }
}

impl std::fmt::Debug for ApnsVoipDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApnsVoipDispatcher")
            .field("base_url", &self.base_url)
            .field("key_id", &self.key_id)
            .field("team_id", &self.team_id)
            .field("bundle_id", &self.bundle_id)
            .finish()
    }
}

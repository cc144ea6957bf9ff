//! Firebase Cloud Messaging HTTP v1 client.
//!
//! Builds the `messages:send` body for one device token and interprets the
//! reply. A send succeeds only when the reply carries a non-empty `name`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use callpush_common::error::{delivery_error, CallpushError};
use callpush_common::http::client::post_json;
use callpush_common::logging::redact_token;
use callpush_common::models::{DeliveryPath, NotificationOutcome};
use callpush_config::FirebaseConfig;

pub const FCM_BASE_URL: &str = "https://fcm.googleapis.com";

/// Message when the provider reply is empty or not JSON.
pub const GENERIC_FAILURE: &str = "Failed to send push notification.";

/// Payload shape of an FCM send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FcmVariant {
    /// Silent data message; the app is woken with `content-available: 1`.
    Data,
    /// Visible notification block plus an APNs alert with sound.
    Alert { title: String, body: String },
}

impl FcmVariant {
    pub fn path(&self) -> DeliveryPath {
        match self {
            FcmVariant::Data => DeliveryPath::FcmData,
            FcmVariant::Alert { .. } => DeliveryPath::FcmAlert,
        }
    }
}

/// Top-level `messages:send` request body.
#[derive(Debug, Serialize)]
pub struct FcmMessage {
    pub message: Message,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    /// FCM only accepts string values here.
    pub data: BTreeMap<String, String>,
    pub android: AndroidConfig,
    pub apns: ApnsOverride,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct AndroidConfig {
    pub priority: String,
}

#[derive(Debug, Serialize)]
pub struct ApnsOverride {
    pub headers: ApnsHeaders,
    pub payload: ApnsPayload,
}

#[derive(Debug, Serialize)]
pub struct ApnsHeaders {
    #[serde(rename = "apns-priority")]
    pub apns_priority: String,
}

#[derive(Debug, Serialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Serialize)]
pub struct Aps {
    #[serde(rename = "content-available", skip_serializing_if = "Option::is_none")]
    pub content_available: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

/// Reply of a successful send.
#[derive(Debug, Deserialize)]
pub struct FcmResponse {
    /// `projects/{project_id}/messages/{message_id}`
    #[serde(default)]
    pub name: String,
}

impl FcmMessage {
    pub fn new(device_token: &str, data: &Value, variant: &FcmVariant) -> Self {
        let (notification, aps) = match variant {
            FcmVariant::Data => (
                None,
                Aps {
                    content_available: Some(1),
                    alert: None,
                    sound: None,
                },
            ),
            FcmVariant::Alert { title, body } => {
                let notification = Notification {
                    title: title.clone(),
                    body: body.clone(),
                };
                (
                    Some(notification.clone()),
                    Aps {
                        content_available: None,
                        alert: Some(notification),
                        sound: Some("default".to_string()),
                    },
                )
            }
        };

        Self {
            message: Message {
                token: device_token.to_string(),
                notification,
                data: string_map(data),
                android: AndroidConfig {
                    priority: "high".to_string(),
                },
                apns: ApnsOverride {
                    headers: ApnsHeaders {
                        apns_priority: "10".to_string(),
                    },
                    payload: ApnsPayload { aps },
                },
            },
        }
    }
}

/// Flattens a JSON object into FCM's string-only data map. Strings are kept
/// as-is, `null` becomes `""`, anything else is serialized as JSON text.
pub fn string_map(data: &Value) -> BTreeMap<String, String> {
    let Some(object) = data.as_object() else {
        return BTreeMap::new();
    };

    object
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct FcmDispatcher {
    client: Client,
    base_url: String,
}

impl FcmDispatcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: FCM_BASE_URL.to_string(),
        }
    }

    pub fn from_config(client: Client, config: &FirebaseConfig) -> Self {
        Self::new(client).with_base_url(config.fcm_base_url.clone())
    }

    /// Sends to a different host, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn send_url(&self, project_id: &str) -> String {
        format!("{}/v1/projects/{}/messages:send", self.base_url, project_id)
    }

    /// Sends one message to `device_token`.
    ///
    /// # Errors
    ///
    /// - `TransportError` if the request cannot be completed
    /// - `DeliveryError` if the reply has no `name`; it carries the raw reply
    ///   body, or a generic message when the body is empty or not JSON
    pub async fn send(
        &self,
        access_token: &str,
        device_token: &str,
        project_id: &str,
        data: &Value,
        variant: &FcmVariant,
    ) -> Result<NotificationOutcome, CallpushError> {
        let message = FcmMessage::new(device_token, data, variant);
        let authorization = format!("Bearer {access_token}");

        debug!(
            "Sending FCM {} message to {}",
            variant.path(),
            redact_token(device_token)
        );

        let reply = post_json(
            &self.client,
            &self.send_url(project_id),
            &[("authorization", authorization.as_str())],
            &message,
        )
        .await?;

        let Some(body) = reply.json() else {
            return Err(delivery_error("fcm", GENERIC_FAILURE));
        };

        let name = serde_json::from_value::<FcmResponse>(body)
            .map(|response| response.name)
            .unwrap_or_default();
        if name.is_empty() {
            return Err(delivery_error("fcm", reply.body));
        }

        info!("FCM accepted message {}", name);
        Ok(NotificationOutcome::delivered(variant.path(), Some(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn call_data() -> Value {
        json!({
            "type": "call",
            "call_id": "u1",
            "app_id": "a1",
            "payload": {"k": 1},
            "missing": null,
        })
    }

    #[test]
    fn test_data_message_shape() {
        let message = FcmMessage::new("dev", &call_data(), &FcmVariant::Data);
        let body = serde_json::to_value(&message).unwrap();

        assert_eq!(
            body,
            json!({
                "message": {
                    "token": "dev",
                    "data": {
                        "type": "call",
                        "call_id": "u1",
                        "app_id": "a1",
                        "payload": "{\"k\":1}",
                        "missing": "",
                    },
                    "android": {"priority": "high"},
                    "apns": {
                        "headers": {"apns-priority": "10"},
                        "payload": {"aps": {"content-available": 1}},
                    },
                }
            })
        );
    }

    #[test]
    fn test_alert_message_shape() {
        let variant = FcmVariant::Alert {
            title: "Alice".into(),
            body: "+15550100".into(),
        };
        let body = serde_json::to_value(FcmMessage::new("dev", &json!({}), &variant)).unwrap();

        assert_eq!(
            body["message"]["notification"],
            json!({"title": "Alice", "body": "+15550100"})
        );
        assert_eq!(
            body["message"]["apns"]["payload"]["aps"],
            json!({"alert": {"title": "Alice", "body": "+15550100"}, "sound": "default"})
        );
    }

    #[tokio::test]
    async fn test_send_success_returns_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/p/messages:send"))
            .and(header("authorization", "Bearer access"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"name": "projects/p/messages/1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = FcmDispatcher::new(Client::new())
            .with_base_url(server.uri())
            .send("access", "dev", "p", &call_data(), &FcmVariant::Data)
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.path, Some(DeliveryPath::FcmData));
        assert_eq!(outcome.message_id.as_deref(), Some("projects/p/messages/1"));
    }

    #[tokio::test]
    async fn test_rejection_carries_raw_body() {
        let server = MockServer::start().await;
        let error_body = r#"{"error":{"code":404,"status":"NOT_FOUND"}}"#;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string(error_body))
            .mount(&server)
            .await;

        let err = FcmDispatcher::new(Client::new())
            .with_base_url(server.uri())
            .send("access", "dev", "p", &call_data(), &FcmVariant::Data)
            .await
            .unwrap_err();

        match err {
            CallpushError::DeliveryError { provider, body } => {
                assert_eq!(provider, "fcm");
                assert_eq!(body, error_body);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_reply_uses_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = FcmDispatcher::new(Client::new())
            .with_base_url(server.uri())
            .send("access", "dev", "p", &call_data(), &FcmVariant::Data)
            .await
            .unwrap_err();

        match err {
            CallpushError::DeliveryError { body, .. } => assert_eq!(body, GENERIC_FAILURE),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_name_is_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": ""})))
            .mount(&server)
            .await;

        let err = FcmDispatcher::new(Client::new())
            .with_base_url(server.uri())
            .send("access", "dev", "p", &call_data(), &FcmVariant::Data)
            .await
            .unwrap_err();

        assert!(matches!(err, CallpushError::DeliveryError { .. }));
    }
}

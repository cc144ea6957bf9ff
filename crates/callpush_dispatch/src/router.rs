//! Delivery path selection and call data extraction.

use serde::Serialize;
use serde_json::{Map, Value};

use callpush_common::models::DeliveryPath;
use callpush_config::FcmMode;
use callpush_firebase::FcmVariant;

use crate::request::NotificationRequest;

pub const DEFAULT_ALERT_TITLE: &str = "Incoming Call";
pub const DEFAULT_ALERT_BODY: &str = "You have an incoming call.";
pub const DEFAULT_ALERT_TYPE: &str = "incoming_call";

/// Data delivered to the app. Missing request fields become empty strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallData {
    #[serde(rename = "type")]
    pub kind: String,
    pub call_id: String,
    pub sip_call_id: String,
    pub app_id: String,
    pub user: String,
    pub realm: String,
    pub platform: String,
    pub cid_name: String,
    pub cid_number: String,
    /// Decoded `payload` field; `null` when absent or not valid JSON.
    pub payload: Value,
}

impl CallData {
    /// The call data as a JSON object, built field by field so it cannot fail.
    pub fn to_value(&self) -> Value {
        let text = [
            ("type", &self.kind),
            ("call_id", &self.call_id),
            ("sip_call_id", &self.sip_call_id),
            ("app_id", &self.app_id),
            ("user", &self.user),
            ("realm", &self.realm),
            ("platform", &self.platform),
            ("cid_name", &self.cid_name),
            ("cid_number", &self.cid_number),
        ];

        let mut object: Map<String, Value> = text
            .into_iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.clone())))
            .collect();
        object.insert("payload".to_string(), self.payload.clone());
        Value::Object(object)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationRouter {
    fcm_mode: FcmMode,
}

impl NotificationRouter {
    pub fn new(fcm_mode: FcmMode) -> Self {
        Self { fcm_mode }
    }

    pub fn fcm_mode(&self) -> FcmMode {
        self.fcm_mode
    }

    /// iOS VoIP calls go to APNs directly; everything else goes through FCM
    /// in the configured shape. Both fields compare case-insensitively.
    pub fn select_path(&self, request: &NotificationRequest) -> DeliveryPath {
        let is = |field: &Option<String>, expected: &str| {
            field
                .as_deref()
                .is_some_and(|value| value.eq_ignore_ascii_case(expected))
        };

        if is(&request.kind, "voip") && is(&request.platform, "ios") {
            return DeliveryPath::ApnsVoip;
        }

        match self.fcm_mode {
            FcmMode::Data => DeliveryPath::FcmData,
            FcmMode::Alert => DeliveryPath::FcmAlert,
        }
    }

    pub fn call_data(&self, request: &NotificationRequest, path: DeliveryPath) -> CallData {
        let text = |field: &Option<String>| field.clone().unwrap_or_default();

        let kind = match (&request.kind, path) {
            (Some(kind), _) => kind.clone(),
            (None, DeliveryPath::FcmAlert) => DEFAULT_ALERT_TYPE.to_string(),
            (None, _) => String::new(),
        };

        CallData {
            kind,
            call_id: text(&request.aleg_uuid),
            sip_call_id: text(&request.x_call_id),
            app_id: text(&request.app_id),
            user: text(&request.user),
            realm: text(&request.realm),
            platform: text(&request.platform),
            cid_name: text(&request.cid_name),
            cid_number: text(&request.cid_number),
            payload: request
                .payload
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok())
                .unwrap_or(Value::Null),
        }
    }

    /// The FCM payload shape for `path`. Alert titles fall back to fixed text
    /// when caller id fields are missing.
    pub fn fcm_variant(&self, request: &NotificationRequest, path: DeliveryPath) -> FcmVariant {
        match path {
            DeliveryPath::FcmAlert => FcmVariant::Alert {
                title: request
                    .cid_name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ALERT_TITLE.to_string()),
                body: request
                    .cid_number
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ALERT_BODY.to_string()),
            },
            _ => FcmVariant::Data,
        }
    }
}

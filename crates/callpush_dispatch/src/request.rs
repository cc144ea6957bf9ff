//! The inbound call event.
//!
//! Callers send a flat map of string fields. It is validated once here;
//! everything after this point works with [`NotificationRequest`].

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use callpush_common::error::{validation_error, CallpushError};

pub const NO_INPUT: &str = "No input provided.";
pub const MISSING_TOKEN: &str = "Device token not found in the input string.";

/// A validated push request. Only `token` is required; other fields are
/// optional and treated as empty when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub token: String,
    /// The `type` field, e.g. `voip` or `call`.
    pub kind: Option<String>,
    /// `platform`, falling back to `pn-platform`.
    pub platform: Option<String>,
    pub aleg_uuid: Option<String>,
    pub x_call_id: Option<String>,
    pub app_id: Option<String>,
    pub user: Option<String>,
    pub realm: Option<String>,
    pub cid_name: Option<String>,
    pub cid_number: Option<String>,
    /// JSON text, decoded by the router.
    pub payload: Option<String>,
    fields: BTreeMap<String, String>,
}

impl NotificationRequest {
    /// Validates the raw field map.
    ///
    /// # Errors
    ///
    /// `ValidationError` if the map is empty or has no non-empty `token`.
    pub fn from_fields(fields: HashMap<String, String>) -> Result<Self, CallpushError> {
        if fields.is_empty() {
            return Err(validation_error(NO_INPUT));
        }

        let fields: BTreeMap<String, String> = fields.into_iter().collect();
        let get = |name: &str| fields.get(name).filter(|v| !v.is_empty()).cloned();

        let token = get("token").ok_or_else(|| validation_error(MISSING_TOKEN))?;

        let request = Self {
            token,
            kind: get("type"),
            platform: get("platform").or_else(|| get("pn-platform")),
            aleg_uuid: get("aleg_uuid"),
            x_call_id: get("x_call_id"),
            app_id: get("app_id"),
            user: get("user"),
            realm: get("realm"),
            cid_name: get("cid_name"),
            cid_number: get("cid_number"),
            payload: get("payload"),
            fields: BTreeMap::new(),
        };

        Ok(Self { fields, ..request })
    }

    /// All fields as received, including ones not modelled above.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// The received fields as a JSON object, for the event log.
    pub fn fields_json(&self) -> String {
        let object: Map<String, Value> = self
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();
        Value::Object(object).to_string()
    }
}

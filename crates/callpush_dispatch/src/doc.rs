#![allow(dead_code)]
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi, ToSchema};

use callpush_common::models::{DeliveryPath, NotificationOutcome};

/// Fields understood by `/push`. Only `token` is required; unknown fields are
/// accepted and recorded in the event log.
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PushFields {
    /// Device token (FCM registration token or APNs VoIP token)
    pub token: String,
    /// Event type; `voip` together with platform `ios` selects APNs
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub platform: Option<String>,
    /// Alternative name for `platform`
    #[serde(rename = "pn-platform")]
    pub pn_platform: Option<String>,
    /// Call id, delivered as `call_id`
    pub aleg_uuid: Option<String>,
    /// SIP Call-ID, delivered as `sip_call_id`
    pub x_call_id: Option<String>,
    pub app_id: Option<String>,
    pub user: Option<String>,
    pub realm: Option<String>,
    pub cid_name: Option<String>,
    pub cid_number: Option<String>,
    /// JSON text, delivered decoded
    pub payload: Option<String>,
}

#[utoipa::path(
    get,
    path = "/push",
    params(PushFields),
    responses(
        (status = 200, description = "Notification accepted by the provider", body = NotificationOutcome,
         example = json!({
             "success": true,
             "path": "fcm_data",
             "message_id": "projects/my-project/messages/0:1700000000000000%abcdef",
             "error": null
         })
        ),
        (status = 400, description = "No input or no device token", body = NotificationOutcome,
         example = json!({
             "success": false,
             "path": null,
             "message_id": null,
             "error": "Validation error: Device token not found in the input string."
         })
        ),
        (status = 401, description = "OAuth token exchange returned no token", body = NotificationOutcome),
        (status = 500, description = "Credentials or signing key unusable", body = NotificationOutcome),
        (status = 502, description = "Provider unreachable or message rejected", body = NotificationOutcome,
         example = json!({
             "success": false,
             "path": "apns_voip",
             "message_id": null,
             "error": "Delivery error: apns - {\"reason\":\"BadDeviceToken\"}"
         })
        )
    ),
    tag = "Push"
)]
fn doc_push_get_handler() {}

#[utoipa::path(
    post,
    path = "/push",
    request_body(content = PushFields, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Notification accepted by the provider", body = NotificationOutcome,
         example = json!({
             "success": true,
             "path": "apns_voip",
             "message_id": "EC1BF194-B3B2-4A7C-8B5F-1D5C7C1E2F3A",
             "error": null
         })
        ),
        (status = 400, description = "No input or no device token", body = NotificationOutcome),
        (status = 401, description = "OAuth token exchange returned no token", body = NotificationOutcome),
        (status = 500, description = "Credentials or signing key unusable", body = NotificationOutcome),
        (status = 502, description = "Provider unreachable or message rejected", body = NotificationOutcome)
    ),
    tag = "Push"
)]
fn doc_push_post_handler() {}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String, example = "ok")),
    tag = "Push"
)]
fn doc_health_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_push_get_handler,
        doc_push_post_handler,
        doc_health_handler,
    ),
    components(
        schemas(
            PushFields,
            NotificationOutcome,
            DeliveryPath,
        )
    ),
    tags(
        (name = "Push", description = "Call push notifications via FCM and APNs")
    ),
    servers(
        (url = "/api", description = "Push API server")
    )
)]
pub struct PushApiDoc;

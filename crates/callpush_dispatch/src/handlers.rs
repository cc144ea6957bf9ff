//! HTTP handlers for the inbound push endpoint.
//!
//! Fields may arrive in the query string, in an urlencoded form body, or
//! both; form values win on conflict.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use callpush_common::error::{validation_error, HttpStatusCode};
use callpush_common::models::NotificationOutcome;

use crate::dispatcher::{DispatchFailure, PushDispatcher};

/// Shared state for the push handlers
#[derive(Clone)]
pub struct PushState {
    pub dispatcher: Arc<PushDispatcher>,
}

impl IntoResponse for DispatchFailure {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.outcome())).into_response()
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

/// Merges query and form fields.
fn collect_fields(
    query: HashMap<String, String>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<HashMap<String, String>, DispatchFailure> {
    let mut fields = query;
    if body.is_empty() || !is_form(headers) {
        return Ok(fields);
    }

    let form: Vec<(String, String)> =
        serde_urlencoded::from_bytes(body).map_err(|e| DispatchFailure {
            path: None,
            error: validation_error(format!("Invalid form body: {e}")),
        })?;
    fields.extend(form);
    Ok(fields)
}

/// Handler for `GET|POST /push`
///
/// # Responses
///
/// - 200 OK: notification accepted by the provider
/// - 400 Bad Request: no input or no device token
/// - 401 Unauthorized: OAuth token exchange returned no token
/// - 500 Internal Server Error: credentials or signing key unusable
/// - 502 Bad Gateway: provider unreachable or message rejected
#[axum::debug_handler]
pub async fn push_handler(
    State(state): State<Arc<PushState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<NotificationOutcome>, DispatchFailure> {
    let fields = collect_fields(query, &headers, &body)?;
    debug!("Received push request with {} fields", fields.len());

    state.dispatcher.dispatch(fields).await.map(Json)
}

/// Handler for `GET /health`
pub async fn health_handler() -> &'static str {
    "ok"
}

// --- File: crates/callpush_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{CallpushError, HttpStatusCode};

// Include the client module
pub mod client;

/// Extension trait for CallpushError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for CallpushError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "kind": self.kind(),
                "code": status_code.as_u16(),
            }
        }));

        (status_code, body).into_response()
    }
}

/// Implement IntoResponse for CallpushError to make it easier to use in Axum handlers.
impl IntoResponse for CallpushError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{delivery_error, validation_error};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_response_shape() {
        let response = validation_error("No input provided.").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({
                "error": {
                    "message": "Validation error: No input provided.",
                    "kind": "validation",
                    "code": 400,
                }
            })
        );
    }

    #[tokio::test]
    async fn test_delivery_error_is_bad_gateway() {
        let response = delivery_error("apns", "BadDeviceToken").into_http_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}

// --- File: crates/callpush_common/src/http/client.rs ---
use reqwest::{header::HeaderMap, Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{transport_error, CallpushError};
use callpush_config::HttpConfig;

/// Creates an HTTP client with explicit connect and total timeouts.
///
/// # Arguments
///
/// * `connect_timeout_secs` - Upper bound for establishing the connection
/// * `timeout_secs` - Upper bound for the whole request, body included
pub fn create_client(connect_timeout_secs: u64, timeout_secs: u64) -> Result<Client, CallpushError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| transport_error(format!("failed to build HTTP client: {e}")))
}

/// Creates an HTTP client that only speaks HTTP/2.
///
/// APNs rejects HTTP/1.1, so the connection goes straight to h2 instead of
/// relying on negotiation.
pub fn create_http2_client(
    connect_timeout_secs: u64,
    timeout_secs: u64,
) -> Result<Client, CallpushError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(timeout_secs))
        .http2_prior_knowledge()
        .build()
        .map_err(|e| transport_error(format!("failed to build HTTP/2 client: {e}")))
}

/// Builds a client from the configured timeouts.
pub fn client_from_config(config: &HttpConfig) -> Result<Client, CallpushError> {
    create_client(config.connect_timeout_secs, config.timeout_secs)
}

/// Status, headers and raw body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The body parsed as JSON, or `None` when it is empty or not JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        if self.body.trim().is_empty() {
            return None;
        }
        serde_json::from_str(&self.body).ok()
    }

    /// A response header as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Turns a non-2xx reply into a `TransportError` carrying status and body.
    pub fn error_for_status(self) -> Result<Self, CallpushError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(transport_error(format!("{}: {}", self.status, self.body)))
        }
    }
}

/// POSTs a JSON body and returns the reply without judging its status.
///
/// Connection failures and timeouts become `TransportError`. Interpreting the
/// status is left to the caller because providers signal rejection in
/// different ways.
///
/// # Arguments
///
/// * `client` - The client to send with
/// * `url` - The URL to post to
/// * `headers` - Extra request headers
/// * `body` - Serialized as the JSON request body
pub async fn post_json<T: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    headers: &[(&str, &str)],
    body: &T,
) -> Result<HttpReply, CallpushError> {
    let mut request = client.post(url).json(body);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let response = request.send().await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.text().await?;

    debug!("POST {} -> {}", url, status);

    Ok(HttpReply {
        status,
        headers,
        body,
    })
}

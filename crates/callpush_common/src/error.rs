use std::fmt;
use thiserror::Error;

/// The error type shared by every callpush crate.
///
/// Each variant is one failure class of a dispatch invocation. None of them is
/// retried; they propagate to the invocation boundary where they are logged
/// and turned into a short message for the caller.
#[derive(Error, Debug)]
pub enum CallpushError {
    /// Credential material or configuration is missing or invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A JWT could not be built or signed
    #[error("Crypto error: {0}")]
    CryptoError(String),

    /// The OAuth token exchange did not yield an access token
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// The inbound request is malformed
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Network or connection failure, including non-2xx replies where the
    /// caller asked for them to be treated as failures
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The provider accepted the connection but rejected the message
    #[error("Delivery error: {provider} - {body}")]
    DeliveryError { provider: String, body: String },
}

impl CallpushError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CallpushError::ConfigError(_) => "config",
            CallpushError::CryptoError(_) => "crypto",
            CallpushError::AuthError(_) => "auth",
            CallpushError::ValidationError(_) => "validation",
            CallpushError::TransportError(_) => "transport",
            CallpushError::DeliveryError { .. } => "delivery",
        }
    }
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for CallpushError {
    fn status_code(&self) -> u16 {
        match self {
            CallpushError::ConfigError(_) => 500,
            CallpushError::CryptoError(_) => 500,
            CallpushError::AuthError(_) => 401,
            CallpushError::ValidationError(_) => 400,
            CallpushError::TransportError(_) => 502,
            CallpushError::DeliveryError { .. } => 502,
        }
    }
}

impl From<reqwest::Error> for CallpushError {
    fn from(err: reqwest::Error) -> Self {
        CallpushError::TransportError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for CallpushError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        CallpushError::CryptoError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> CallpushError {
    CallpushError::ConfigError(message.to_string())
}

pub fn crypto_error<T: fmt::Display>(message: T) -> CallpushError {
    CallpushError::CryptoError(message.to_string())
}

pub fn auth_error<T: fmt::Display>(message: T) -> CallpushError {
    CallpushError::AuthError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> CallpushError {
    CallpushError::ValidationError(message.to_string())
}

pub fn transport_error<T: fmt::Display>(message: T) -> CallpushError {
    CallpushError::TransportError(message.to_string())
}

pub fn delivery_error<T: fmt::Display>(provider: &str, body: T) -> CallpushError {
    CallpushError::DeliveryError {
        provider: provider.to_string(),
        body: body.to_string(),
    }
}

pub type Result<T, E = CallpushError> = std::result::Result<T, E>;

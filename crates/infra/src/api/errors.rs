//! API-specific error types
//!
//! Classifies failed portal API calls by status code or transport failure.

use std::time::Duration;

use reqwest::StatusCode;
use taxdesk_core::SessionError;
use taxdesk_domain::TaxDeskError;
use thiserror::Error;

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// Classify a non-success response
    ///
    /// The portal reports failures as `{"error": "..."}`; that message is
    /// preferred over the raw body.
    pub fn from_status(status: StatusCode, url: &str, body: &str) -> Self {
        let detail = error_message(body);
        let message = match detail {
            Some(detail) => format!("{url} returned status {status}: {detail}"),
            None => format!("{url} returned status {status}"),
        };

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Self::Auth(message)
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimit(message)
        } else if status.is_server_error() {
            Self::Server(message)
        } else if status.is_client_error() {
            Self::Client(message)
        } else {
            Self::Network(message)
        }
    }

    /// Map a transport failure, using `timeout` when the request timed out
    pub fn from_transport(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else if err.is_decode() {
            Self::Client(format!("Failed to parse response: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => match value.get("error").and_then(serde_json::Value::as_str) {
            Some(message) => Some(message.to_string()),
            None => Some(trimmed.to_string()),
        },
        Err(_) => Some(trimmed.to_string()),
    }
}

impl From<ApiError> for TaxDeskError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Auth(message) => TaxDeskError::Auth(message),
            ApiError::Config(message) => TaxDeskError::Config(message),
            ApiError::Client(message) => TaxDeskError::InvalidInput(message),
            other @ (ApiError::RateLimit(_)
            | ApiError::Server(_)
            | ApiError::Network(_)
            | ApiError::Timeout(_)) => TaxDeskError::Network(other.to_string()),
        }
    }
}

impl From<ApiError> for SessionError {
    fn from(err: ApiError) -> Self {
        SessionError::Transport(err.to_string())
    }
}

//! Error types for queue service operations.

use std::path::PathBuf;
use thiserror::Error;

/// Outcome of a failed call against the identity or queue service
#[derive(Debug, Error)]
pub enum QueueServiceError {
    #[error("Credentials file '{}' not found", path.display())]
    CredentialsFileNotFound { path: PathBuf },

    #[error("Invalid credentials file '{}': {message}", path.display())]
    InvalidCredentials { path: PathBuf, message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Client has not authenticated")]
    NotAuthenticated,

    #[error("Queue not found: {queue_name}")]
    QueueNotFound { queue_name: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("Unexpected response ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl QueueServiceError {
    /// Check if the error means the supplied credentials (or region) were rejected
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed { .. } | Self::InvalidCredentials { .. }
        )
    }

    /// Map an HTTP status that has no dedicated meaning for the call site
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            "no response body".to_string()
        } else {
            body.trim().to_string()
        };

        match status {
            401 | 403 => Self::AuthenticationFailed { message },
            503 => Self::ServiceUnavailable { message },
            _ => Self::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for QueueServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Network(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            Self::Network(format!("Connection failed: {}", e))
        } else if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Network(format!("HTTP request failed: {}", e))
        }
    }
}

/// Validation errors for queue names, TTLs and regions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

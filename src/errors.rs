// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for template service operations
//!
//! A [`ServiceError`] is a hard failure: the backend could not be reached,
//! refused our credentials, did not know a template, or answered with
//! something we could not read. It always aborts a deployment run. A template
//! rejecting its variables is *not* a `ServiceError`; see
//! [`crate::client::ValidationResult`].

use thiserror::Error;

/// Errors that can occur talking to the template service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Connection, timeout or other transport failure
    #[error("Template service transport error: {0}")]
    Transport(String),

    /// Credentials rejected (401/403)
    #[error("Template service rejected credentials ({status}): {message}")]
    Authentication { status: u16, message: String },

    /// Template id not known to the service
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// Any other non-success response
    #[error("Template service returned {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body did not match the expected schema
    #[error("Failed to decode template service response: {0}")]
    Decode(String),

    /// Client could not be configured
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ServiceError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for template service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Decode(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

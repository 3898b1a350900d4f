//! Auth error types

use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("request failed"))]
    Api { status: u16, message: Option<String> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] radar_storage::StorageError),

    #[error("Invalid API base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(Arc<AuthError>),

    #[error("Session superseded before the operation completed")]
    SessionSuperseded,
}

impl AuthError {
    /// Display message provided by the server, if the failure carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            AuthError::Api { message, .. } => message.as_deref(),
            AuthError::RefreshFailed(inner) => inner.server_message(),
            _ => None,
        }
    }

    /// HTTP status of the failing response, if the failure was an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Api { status, .. } => Some(*status),
            AuthError::RefreshFailed(inner) => inner.status(),
            _ => None,
        }
    }
}

//! API error types.

use thiserror::Error;

/// Errors that can occur when talking to the Lookbook backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (connection, DNS, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered with a non-success status
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// An update or delete was attempted on an entity that was never persisted
    #[error("Cannot {0} without an id")]
    MissingId(&'static str),

    /// A new outfit item belongs to an outfit that has no id yet
    #[error("Outfit item has no persisted parent outfit")]
    MissingParent,
}

impl ApiError {
    /// True for 401/403 responses.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == 401 || *status == 403)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Http(e.to_string())
        }
    }
}

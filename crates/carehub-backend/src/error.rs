//! Error types for backend access
//!
//! Every remote failure is one of:
//! - Transport (`Http`, `Timeout`)
//! - A non-2xx reply (`Status`), carrying the backend's own message when it sent one
//! - A missing row (`NotFound`), which screens recover from with a single route
//! - A body that does not match the expected shape (`Decode`)
//! - No signed-in user (`Unauthenticated`)
//! - Caller gave up (`Cancelled`)

use carehub_core::booking::failure_message;

/// Backend error type
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Connection or protocol failure
    #[error("request failed: {0}")]
    Http(String),

    /// Backend answered with an error status
    #[error("backend returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        /// HTTP status code
        status: u16,
        /// Error text from the response body, if any
        message: Option<String>,
    },

    /// No row with this id
    #[error("{entity} {id} not found")]
    NotFound {
        /// Table or entity name
        entity: String,
        /// Requested id
        id: String,
    },

    /// Response body did not decode
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Operation needs a signed-in user
    #[error("not signed in")]
    Unauthenticated,

    /// Cancelled through a [`CancellationToken`](crate::CancellationToken)
    #[error("request cancelled")]
    Cancelled,

    /// No response within the configured timeout
    #[error("request timed out after {secs}s")]
    Timeout {
        /// Configured timeout
        secs: u64,
    },

    /// Client could not be built from configuration
    #[error("invalid backend configuration: {0}")]
    Config(String),
}

impl BackendError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Whether this is a missing-row error
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Text to show the user
    ///
    /// The backend's own message is passed through verbatim; everything else
    /// becomes the generic fallback.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => failure_message(message.as_deref()),
            _ => failure_message(None),
        }
    }

    /// Create not-found error
    #[inline]
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}

/// Result alias for backend calls
pub type BackendResult<T> = Result<T, BackendError>;

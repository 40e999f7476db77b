//! Unified error types for the webex-bot core.
//!
//! Remote API failures, malformed webhook payloads, handler failures and
//! transport problems each get their own enum so callers can tell a missing
//! remote entity apart from a programming error.

use thiserror::Error;

/// Error type returned by handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// API Errors
// =============================================================================

/// Errors returned by a [`MessagingApi`](crate::MessagingApi) implementation.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The requested entity does not exist or is not visible to the bot.
    #[error("{resource} '{id}' not found")]
    NotFound {
        /// The resource kind that was requested (e.g. `messages`).
        resource: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// The platform answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Failed to serialize a request or deserialize a response.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Returns `true` when the platform itself rejected the request.
    ///
    /// These are the failures a text hook treats as "no match": the entity is
    /// gone or the bot may not read it. Local failures are not included.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Status { .. })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Payload Errors
// =============================================================================

/// Errors raised while reading an inbound webhook notification.
#[derive(Debug, Clone, Error)]
pub enum PayloadError {
    /// The body is not a JSON object.
    #[error("webhook payload must be a JSON object")]
    NotAnObject,

    /// A field has an unexpected JSON type.
    #[error("webhook payload field '{field}' has an invalid type")]
    InvalidField {
        /// The offending field.
        field: &'static str,
    },

    /// The `data.id` reference needed to resolve the entity is missing.
    #[error("webhook payload for '{resource}' has no data.id")]
    MissingDataId {
        /// The resource tag of the payload.
        resource: String,
    },
}

// =============================================================================
// Extraction Errors
// =============================================================================

/// Errors that can occur while extracting handler parameters.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The resolved object is not of the requested kind.
    #[error("resolved object mismatch: expected '{expected}', got '{got}'")]
    ResolvedMismatch {
        /// Expected kind.
        expected: &'static str,
        /// Actual kind.
        got: &'static str,
    },

    /// The hook did not produce capture groups.
    #[error("no capture groups available")]
    NoGroups,

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Errors that abort a dispatch pass.
///
/// A pass either evaluates every hook or stops at the first of these.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The payload could not be interpreted.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// A remote fetch required for classification failed.
    #[error("hook '{hook}' could not resolve the payload: {source}")]
    Resolve {
        /// Name of the hook being classified.
        hook: String,
        /// Underlying API failure.
        #[source]
        source: ApiError,
    },

    /// A handler returned an error.
    #[error("hook '{hook}' handler failed: {source}")]
    Handler {
        /// Name of the hook whose handler failed.
        hook: String,
        /// The handler's error.
        #[source]
        source: BoxError,
    },
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Binding the listening socket failed.
    #[error("failed to bind {addr}: {reason}")]
    BindFailed {
        /// The address that could not be bound.
        addr: String,
        /// Reason for failure.
        reason: String,
    },

    /// The server stopped with an error.
    #[error("server error: {0}")]
    Server(String),

    /// Invalid configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for a dispatch pass.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_errors() {
        assert!(
            ApiError::NotFound {
                resource: "messages",
                id: "m1".into()
            }
            .is_remote()
        );
        assert!(
            ApiError::Status {
                status: 403,
                message: "forbidden".into()
            }
            .is_remote()
        );
        assert!(!ApiError::Transport("connection refused".into()).is_remote());
        assert!(!ApiError::Serialization("eof".into()).is_remote());
    }

    #[test]
    fn test_dispatch_error_display() {
        let err = DispatchError::Resolve {
            hook: "cards".into(),
            source: ApiError::Transport("timeout".into()),
        };
        assert_eq!(
            err.to_string(),
            "hook 'cards' could not resolve the payload: transport error: timeout"
        );
    }
}

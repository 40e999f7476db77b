//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use webex_bot_core::{ApiError, TransportError};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A webhook management call failed.
    #[error("Webhook setup failed: {0}")]
    Api(#[from] ApiError),

    /// The REST client or webhook server failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A `hears` pattern does not compile.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// No public URL is configured.
    #[error("No public URL configured; set tunnel.public_url")]
    MissingPublicUrl,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

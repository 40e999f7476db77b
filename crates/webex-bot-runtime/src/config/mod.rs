//! Configuration module for the webex-bot runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for the bot identity, the webhook server, the REST client, the public URL
//! and logging.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ApiConfig, BotConfig, DEFAULT_BOT_NAME, DEFAULT_PORT, LogFormat, LogLevel, LogOutput,
    LogRotation, LoggingConfig, ServerConfig, SpanEventConfig, TunnelConfig, WebexBotConfig,
    WebhookConfig,
};
pub use validation::validate_config;

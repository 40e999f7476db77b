//! webex-bot runtime - lifecycle and configuration for webhook bots.
//!
//! This crate provides:
//! - The bot itself ([`WebexBot`]): hook registration, webhook registration
//!   on the platform, serving and shutdown
//! - figment-based configuration ([`config`])
//! - Logging setup ([`logging`])
//! - Reply helpers: cards, mentions and help text ([`helpers`])
//!
//! ```ignore
//! use webex_bot_runtime::WebexBot;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut bot = WebexBot::builder().build()?;
//!     bot.hears("hi|hello", greet)?;
//!
//!     // Run until Ctrl+C
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! The platform only delivers webhooks to a public URL. Point a tunnel at
//! `server.host:server.port` and set `tunnel.public_url` accordingly.

pub mod config;
pub mod error;
pub mod helpers;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, WebexBotConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use helpers::{Mentionable, help_text, mention, mention_id, send_card, send_help};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{
    ATTACHMENT_ACTIONS_WEBHOOK_NAME, EVENTS_WEBHOOK_NAME, WebexBot, WebexBotBuilder,
    shutdown_signal,
};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}

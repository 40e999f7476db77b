//! # webex-bot
//!
//! A webhook-driven chat bot framework for Webex.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  POST /{bot}/events   ┌────────────┐     ┌──────────────────────────┐
//! │ Platform │──────────────────────▶│ Dispatcher │────▶│ Hook "hi|hello"          │──▶ handler
//! │          │  POST /{bot}/attach.. │            │────▶│ Hook on("memberships")   │──▶ handler
//! └──────────┘                       └────────────┘     └──────────────────────────┘
//!      ▲                                   │ get_message / get_person / ...
//!      └───────────────────────────────────┘
//! ```
//!
//! - **Runtime** ([`runtime`]): configuration, logging, webhook registration, serving
//! - **Dispatcher**: runs every hook over each notification, in registration order
//! - **Hooks**: a resource filter or text patterns plus an Axum-style handler
//! - **Transport** ([`transport`]): the REST client and the webhook ingress
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use webex_bot::prelude::*;
//!
//! async fn say_hi(message: Message, api: BoxedApi) -> Result<Message, ApiError> {
//!     let person = api.get_person(message.person_id.as_deref().unwrap_or_default()).await?;
//!     let room = message.room_id.clone().unwrap_or_default();
//!     let text = format!("Hi {}", person.display_name.unwrap_or_default());
//!     api.create_message(&NewMessage::to_room(room).text(text)).await
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut bot = WebexBot::builder().build()?;
//!     bot.hears("hi|hello", say_hi)?;
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default), `yaml-config`, `json-config`: configuration file formats
//! - `json-log`: JSON log output
//! - `testing`: the in-memory `MessagingApi` used in tests

pub use webex_bot_core as core;
pub use webex_bot_runtime as runtime;
pub use webex_bot_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use webex_bot::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use webex_bot_runtime::{WebexBot, WebexBotConfig};

    // Reply helpers
    pub use webex_bot_runtime::{mention, mention_id};

    // Hooks and dispatch
    pub use webex_bot_core::{Dispatcher, Hook, HookBuilder, Pattern};

    // Extractors - for handler parameters
    pub use webex_bot_core::{Captures, Data, FromContext, HookContext};

    // Platform types
    pub use webex_bot_core::{
        ApiError, Attachment, AttachmentAction, BoxedApi, EventKind, Membership, Message,
        MessagingApi, NewMessage, Person, Resource, WebhookPayload,
    };
}

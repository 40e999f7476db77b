//! # webex-bot core
//!
//! The hook matching and dispatch engine of the webex-bot framework.
//!
//! A webhook notification arrives as `{resource, event, data}`. The
//! [`Dispatcher`] runs it past every registered [`Hook`] in order; each hook
//! classifies it, fetching the full message or card submission from the
//! platform when only an ID was delivered, and runs its handler on a match.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! - **Payloads**: [`WebhookPayload`], [`Resource`], [`EventKind`], [`Strategy`]
//! - **Platform models**: [`Message`], [`Person`], [`AttachmentAction`], [`Webhook`]
//! - **Match results**: [`Matched`], [`Resolved`], [`Extracted`], [`HookContext`]
//!
//! ### Framework Layer
//!
//! - **Hooks**: [`Hook`] built through `Hook::on` / `Hook::hears`
//! - **Handlers**: async functions with [`FromContext`] parameters ([`Handler`])
//! - **Dispatcher**: ordered evaluation of hooks ([`Dispatcher`])
//!
//! ### Integration Layer
//!
//! - **Platform API**: the [`MessagingApi`] trait, implemented over REST by
//!   `webex-bot-transport`
//!
//! ## Example
//!
//! ```rust,ignore
//! use webex_bot_core::prelude::*;
//!
//! async fn greet(message: Message, api: BoxedApi) -> Result<(), ApiError> {
//!     let room = message.room_id.clone().unwrap_or_default();
//!     api.create_message(&NewMessage::to_room(room).text("Hello!")).await?;
//!     Ok(())
//! }
//!
//! let dispatcher = Dispatcher::new(api)
//!     .with(Hook::hears("hi|hello")?.description("Say hello").handler(greet));
//!
//! dispatcher.dispatch_value(body).await?;
//! ```

// Architectural layers
pub mod error;
pub mod foundation;
pub mod framework;
pub mod integration;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export error types
pub use error::{
    ApiError, ApiResult, BoxError, DispatchError, DispatchResult, ExtractError, ExtractResult,
    PayloadError, TransportError, TransportResult,
};

// Re-export foundation types
pub use foundation::{
    ADAPTIVE_CARD_CONTENT_TYPE, Attachment, AttachmentAction, BOT_EMAIL_SUFFIX, EventKind,
    Extracted, Groups, HookContext, Matched, Membership, Message, NewMessage, NewWebhook, Person,
    Resolved, Resource, Strategy, Webhook, WebhookPayload, is_bot_email,
};

// Re-export framework types
pub use framework::{
    BoxedHandler, Captures, Data, Dispatcher, FromContext, Handler, HandlerResult, Hook,
    HookBuilder, IntoHandlerResult, Pattern, into_handler,
};

// Re-export integration types
pub use integration::{BoxedApi, MessagingApi};

/// Prelude for common imports.
pub mod prelude {
    pub use super::error::{ApiError, BoxError, DispatchError};
    pub use super::foundation::*;
    pub use super::framework::{
        Captures, Data, Dispatcher, FromContext, Handler, Hook, HookBuilder, into_handler,
    };
    pub use super::integration::{BoxedApi, MessagingApi};
}

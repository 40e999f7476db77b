//! Extractor system for handler parameters.
//!
//! The [`FromContext`] trait defines how a type is pulled out of a
//! [`HookContext`] so it can be used directly as a handler parameter.

use std::sync::Arc;

use serde_json::Value;

use crate::error::ExtractError;
use crate::foundation::context::{Extracted, Groups, HookContext, Resolved};
use crate::foundation::model::{AttachmentAction, Message};
use crate::foundation::payload::WebhookPayload;
use crate::integration::api::BoxedApi;

/// A trait for types that can be extracted from a [`HookContext`].
///
/// # Error Handling
///
/// When extraction fails the handler is skipped, the same way an axum route
/// rejects a request whose extractors fail.
///
/// # Example
///
/// ```rust,ignore
/// use webex_bot_core::{ExtractError, FromContext, HookContext};
///
/// struct RoomId(String);
///
/// impl FromContext for RoomId {
///     fn from_context(ctx: &HookContext) -> Result<Self, ExtractError> {
///         ctx.resolved()
///             .as_message()
///             .and_then(|m| m.room_id.clone())
///             .map(RoomId)
///             .ok_or_else(|| ExtractError::custom("no room"))
///     }
/// }
/// ```
pub trait FromContext: Sized {
    /// Attempts to extract this type from the given context.
    fn from_context(ctx: &HookContext) -> Result<Self, ExtractError>;
}

impl FromContext for HookContext {
    fn from_context(ctx: &HookContext) -> Result<Self, ExtractError> {
        Ok(ctx.clone())
    }
}

impl FromContext for Resolved {
    fn from_context(ctx: &HookContext) -> Result<Self, ExtractError> {
        Ok(ctx.resolved().clone())
    }
}

impl FromContext for Extracted {
    fn from_context(ctx: &HookContext) -> Result<Self, ExtractError> {
        Ok(ctx.extracted().clone())
    }
}

/// The message a text hook matched on.
impl FromContext for Message {
    fn from_context(ctx: &HookContext) -> Result<Self, ExtractError> {
        ctx.resolved()
            .as_message()
            .cloned()
            .ok_or_else(|| mismatch("message", ctx.resolved()))
    }
}

/// The card submission a card hook matched on.
impl FromContext for AttachmentAction {
    fn from_context(ctx: &HookContext) -> Result<Self, ExtractError> {
        ctx.resolved()
            .as_attachment_action()
            .cloned()
            .ok_or_else(|| mismatch("attachment_action", ctx.resolved()))
    }
}

/// The untouched `data` object of a generic match.
#[derive(Debug, Clone, PartialEq)]
pub struct Data(pub Value);

impl FromContext for Data {
    fn from_context(ctx: &HookContext) -> Result<Self, ExtractError> {
        ctx.resolved()
            .as_data()
            .cloned()
            .map(Data)
            .ok_or_else(|| mismatch("data", ctx.resolved()))
    }
}

/// Capture groups of a text match, one entry per pattern matching at the
/// start of the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures(pub Vec<Groups>);

impl Captures {
    /// The first captured group of the first anchored pattern.
    pub fn first(&self) -> Option<&str> {
        self.0.first()?.first()?.as_deref()
    }
}

impl FromContext for Captures {
    fn from_context(ctx: &HookContext) -> Result<Self, ExtractError> {
        ctx.extracted()
            .groups
            .clone()
            .map(Captures)
            .ok_or(ExtractError::NoGroups)
    }
}

/// The raw inbound notification.
impl FromContext for Arc<WebhookPayload> {
    fn from_context(ctx: &HookContext) -> Result<Self, ExtractError> {
        Ok(ctx.payload_arc())
    }
}

/// The platform API, for replying from handlers.
impl FromContext for BoxedApi {
    fn from_context(ctx: &HookContext) -> Result<Self, ExtractError> {
        Ok(Arc::clone(ctx.api()))
    }
}

/// Optional parameters never reject the context.
impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &HookContext) -> Result<Self, ExtractError> {
        Ok(T::from_context(ctx).ok())
    }
}

fn mismatch(expected: &'static str, got: &Resolved) -> ExtractError {
    ExtractError::ResolvedMismatch {
        expected,
        got: got.kind(),
    }
}

//! Match results and the context handed to handlers.

use std::sync::Arc;

use serde_json::Value;

use crate::foundation::model::{AttachmentAction, Message};
use crate::foundation::payload::WebhookPayload;
use crate::integration::api::BoxedApi;

/// Capture groups of one pattern; `None` for groups that did not participate.
pub type Groups = Vec<Option<String>>;

/// The domain object a payload was resolved into.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// A fetched message (text hooks).
    Message(Message),
    /// A fetched card submission (card hooks).
    AttachmentAction(AttachmentAction),
    /// The payload's `data` object, untouched (generic hooks).
    Data(Value),
}

impl Resolved {
    /// Short name of the variant, used in logs and extraction errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::AttachmentAction(_) => "attachment_action",
            Self::Data(_) => "data",
        }
    }

    /// Returns the message, if this is one.
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the attachment action, if this is one.
    pub fn as_attachment_action(&self) -> Option<&AttachmentAction> {
        match self {
            Self::AttachmentAction(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the raw data, if this is a generic match.
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Self::Data(v) => Some(v),
            _ => None,
        }
    }
}

/// Data extracted while matching.
///
/// `groups` is `None` for card and generic matches. For text matches it holds
/// one entry per pattern that matches at the start of the text, in pattern
/// order; it may be empty when patterns only matched further in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub groups: Option<Vec<Groups>>,
}

impl Extracted {
    /// Extracted data for a text match.
    pub fn with_groups(groups: Vec<Groups>) -> Self {
        Self {
            groups: Some(groups),
        }
    }

    /// Returns `true` if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.groups.is_none()
    }
}

/// A successful classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Matched {
    pub resolved: Resolved,
    pub extracted: Extracted,
}

impl Matched {
    /// Creates a match with nothing extracted.
    pub fn new(resolved: Resolved) -> Self {
        Self {
            resolved,
            extracted: Extracted::default(),
        }
    }
}

/// Everything a handler may ask for.
///
/// One context is built per fired hook; the payload and API handle are shared.
#[derive(Clone)]
pub struct HookContext {
    hook: Arc<str>,
    matched: Matched,
    payload: Arc<WebhookPayload>,
    api: BoxedApi,
}

impl HookContext {
    /// Creates a new context.
    pub fn new(
        hook: Arc<str>,
        matched: Matched,
        payload: Arc<WebhookPayload>,
        api: BoxedApi,
    ) -> Self {
        Self {
            hook,
            matched,
            payload,
            api,
        }
    }

    /// Name of the hook being run.
    pub fn hook_name(&self) -> &str {
        &self.hook
    }

    /// The resolved domain object.
    pub fn resolved(&self) -> &Resolved {
        &self.matched.resolved
    }

    /// Data extracted during matching.
    pub fn extracted(&self) -> &Extracted {
        &self.matched.extracted
    }

    /// The raw inbound notification.
    pub fn payload(&self) -> &WebhookPayload {
        &self.payload
    }

    /// Shared handle to the payload.
    pub fn payload_arc(&self) -> Arc<WebhookPayload> {
        Arc::clone(&self.payload)
    }

    /// The platform API.
    pub fn api(&self) -> &BoxedApi {
        &self.api
    }
}

impl std::fmt::Debug for HookContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookContext")
            .field("hook", &self.hook)
            .field("resolved", &self.matched.resolved.kind())
            .field("extracted", &self.matched.extracted)
            .finish()
    }
}

//! Foundation layer - payloads, platform models and match results.

pub mod context;
pub mod model;
pub mod payload;

pub use context::{Extracted, Groups, HookContext, Matched, Resolved};
pub use model::{
    ADAPTIVE_CARD_CONTENT_TYPE, Attachment, AttachmentAction, BOT_EMAIL_SUFFIX, Membership,
    Message, NewMessage, NewWebhook, Person, Webhook, is_bot_email,
};
pub use payload::{EventKind, Resource, Strategy, WebhookPayload};

//! Platform entity models.
//!
//! These mirror the JSON objects returned by the Webex REST API. Field names
//! are camelCase on the wire; unknown fields are ignored and optional fields
//! default to `None` so partially populated responses still deserialize.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Email domain suffix used by automated (bot) accounts.
pub const BOT_EMAIL_SUFFIX: &str = "webex.bot";

/// Content type of an adaptive card attachment.
pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";

/// Returns `true` if the email address belongs to a bot account.
pub fn is_bot_email(email: &str) -> bool {
    email.ends_with(BOT_EMAIL_SUFFIX)
}

/// A message posted in a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message ID.
    pub id: String,
    /// Room the message was posted in.
    #[serde(default)]
    pub room_id: Option<String>,
    /// Room type (`direct` or `group`).
    #[serde(default)]
    pub room_type: Option<String>,
    /// Plain text content.
    #[serde(default)]
    pub text: Option<String>,
    /// Markdown content.
    #[serde(default)]
    pub markdown: Option<String>,
    /// HTML content.
    #[serde(default)]
    pub html: Option<String>,
    /// Author's person ID.
    #[serde(default)]
    pub person_id: Option<String>,
    /// Author's email.
    #[serde(default)]
    pub person_email: Option<String>,
    /// Parent message ID for threaded replies.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// People mentioned in the message.
    #[serde(default)]
    pub mentioned_people: Vec<String>,
    /// File URLs attached to the message.
    #[serde(default)]
    pub files: Vec<String>,
    /// Card attachments.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Creation timestamp (ISO 8601).
    #[serde(default)]
    pub created: Option<String>,
}

impl Message {
    /// Returns the message text, or an empty string for text-less messages.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// A user or bot account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Person ID.
    pub id: String,
    /// Email addresses.
    #[serde(default)]
    pub emails: Vec<String>,
    /// Full display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Nickname.
    #[serde(default)]
    pub nick_name: Option<String>,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Organization ID.
    #[serde(default)]
    pub org_id: Option<String>,
    /// Account type as reported by the platform (`person`, `bot`, ...).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Creation timestamp (ISO 8601).
    #[serde(default)]
    pub created: Option<String>,
}

impl Person {
    /// Returns `true` if any of this person's emails is a bot address.
    pub fn is_bot(&self) -> bool {
        self.emails.iter().any(|e| is_bot_email(e))
    }
}

/// A person's membership in a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    /// Membership ID.
    pub id: String,
    /// Room ID.
    #[serde(default)]
    pub room_id: Option<String>,
    /// Member's person ID.
    #[serde(default)]
    pub person_id: Option<String>,
    /// Member's email.
    #[serde(default)]
    pub person_email: Option<String>,
    /// Member's display name.
    #[serde(default)]
    pub person_display_name: Option<String>,
    /// Member's organization ID.
    #[serde(default)]
    pub person_org_id: Option<String>,
    /// Whether the member moderates the room.
    #[serde(default)]
    pub is_moderator: bool,
    /// Creation timestamp (ISO 8601).
    #[serde(default)]
    pub created: Option<String>,
}

impl Membership {
    /// Returns `true` if the member's email is a bot address.
    pub fn is_bot(&self) -> bool {
        self.person_email.as_deref().is_some_and(is_bot_email)
    }
}

/// A card submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentAction {
    /// Action ID.
    pub id: String,
    /// Action type (`submit`).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// ID of the message carrying the card.
    #[serde(default)]
    pub message_id: Option<String>,
    /// Submitted card inputs.
    #[serde(default)]
    pub inputs: Map<String, Value>,
    /// Submitter's person ID.
    #[serde(default)]
    pub person_id: Option<String>,
    /// Room ID.
    #[serde(default)]
    pub room_id: Option<String>,
    /// Creation timestamp (ISO 8601).
    #[serde(default)]
    pub created: Option<String>,
}

impl AttachmentAction {
    /// Returns a submitted input as a string, if present.
    pub fn input(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).and_then(Value::as_str)
    }
}

/// A card attachment on a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Attachment content type.
    pub content_type: String,
    /// Card body.
    pub content: Value,
}

impl Attachment {
    /// Wraps an adaptive card body.
    pub fn adaptive_card(card: Value) -> Self {
        Self {
            content_type: ADAPTIVE_CARD_CONTENT_TYPE.to_string(),
            content: card,
        }
    }
}

/// A registered webhook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    /// Webhook ID.
    pub id: String,
    /// Webhook name.
    #[serde(default)]
    pub name: String,
    /// URL notifications are delivered to.
    #[serde(default)]
    pub target_url: String,
    /// Resource filter.
    #[serde(default)]
    pub resource: String,
    /// Event filter.
    #[serde(default)]
    pub event: String,
    /// Additional filter expression.
    #[serde(default)]
    pub filter: Option<String>,
    /// Status (`active` / `inactive`).
    #[serde(default)]
    pub status: Option<String>,
    /// Creation timestamp (ISO 8601).
    #[serde(default)]
    pub created: Option<String>,
}

/// Request body for creating a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_person_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_person_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl NewMessage {
    /// Creates a message addressed to a room.
    pub fn to_room(room_id: impl Into<String>) -> Self {
        Self {
            room_id: Some(room_id.into()),
            ..Default::default()
        }
    }

    /// Sets the plain text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the markdown text.
    pub fn markdown(mut self, markdown: impl Into<String>) -> Self {
        self.markdown = Some(markdown.into());
        self
    }

    /// Replies in the thread of the given message.
    pub fn in_thread(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Adds an attachment.
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Request body for registering a webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWebhook {
    pub name: String,
    pub target_url: String,
    pub resource: String,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

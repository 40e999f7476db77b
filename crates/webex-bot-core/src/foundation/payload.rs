//! Inbound webhook notifications.
//!
//! The platform posts a JSON notification of the form
//! `{ "resource": "...", "event": "...", "data": { "id": "...", ... } }` for
//! every subscribed change. [`WebhookPayload`] keeps the raw JSON verbatim and
//! exposes the `(resource, event)` pair as typed tags, together with the
//! [`Strategy`] the hook engine uses to resolve it.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value, json};

use crate::error::PayloadError;

// ============================================================================
// Resource / Event Tags
// ============================================================================

/// The subject of a webhook notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Wildcard used when registering webhooks.
    All,
    Messages,
    AttachmentActions,
    Memberships,
    Rooms,
    Meetings,
    /// Any tag this crate does not know about.
    Other(String),
}

impl Resource {
    /// Returns the wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Messages => "messages",
            Self::AttachmentActions => "attachmentActions",
            Self::Memberships => "memberships",
            Self::Rooms => "rooms",
            Self::Meetings => "meetings",
            Self::Other(s) => s,
        }
    }
}

impl FromStr for Resource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all" => Self::All,
            "messages" => Self::Messages,
            "attachmentActions" => Self::AttachmentActions,
            "memberships" => Self::Memberships,
            "rooms" => Self::Rooms,
            "meetings" => Self::Meetings,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<&str> for Resource {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(resource) => resource,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The lifecycle phase of a webhook notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Wildcard used when registering webhooks.
    All,
    Created,
    Updated,
    Deleted,
    /// Any tag this crate does not know about.
    Other(String),
}

impl EventKind {
    /// Returns the wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Other(s) => s,
        }
    }
}

impl FromStr for EventKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all" => Self::All,
            "created" => Self::Created,
            "updated" => Self::Updated,
            "deleted" => Self::Deleted,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(event) => event,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Classification Strategy
// ============================================================================

/// How a payload's subject is resolved during classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Card submission: fetch the attachment action.
    CardInteraction,
    /// Posted message: fetch the message and its sender, then match text.
    TextHears,
    /// Anything else: hand over `data` as-is.
    Generic,
}

// ============================================================================
// WebhookPayload
// ============================================================================

/// A parsed webhook notification.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookPayload {
    resource: Resource,
    event: EventKind,
    raw: Value,
}

impl WebhookPayload {
    /// Parses a notification body.
    ///
    /// Missing `resource` or `event` fields are read as empty tags, so such a
    /// payload only ever matches hooks that filter on the empty string.
    pub fn from_value(raw: Value) -> Result<Self, PayloadError> {
        let obj = raw.as_object().ok_or(PayloadError::NotAnObject)?;
        let resource = tag(obj, "resource")?.into();
        let event = tag(obj, "event")?.into();
        Ok(Self {
            resource,
            event,
            raw,
        })
    }

    /// Builds a payload from its parts.
    pub fn new(resource: Resource, event: EventKind, data: Value) -> Self {
        let raw = json!({
            "resource": resource.as_str(),
            "event": event.as_str(),
            "data": data,
        });
        Self {
            resource,
            event,
            raw,
        }
    }

    /// The notification subject.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// The lifecycle phase.
    pub fn event(&self) -> &EventKind {
        &self.event
    }

    /// The `data` object, or `Null` when absent.
    pub fn data(&self) -> &Value {
        self.raw.get("data").unwrap_or(&Value::Null)
    }

    /// The `data.id` reference, if present.
    pub fn data_id(&self) -> Option<&str> {
        self.data().get("id").and_then(Value::as_str)
    }

    /// The `data.id` reference, or an error naming the resource.
    pub fn require_data_id(&self) -> Result<&str, PayloadError> {
        self.data_id().ok_or_else(|| PayloadError::MissingDataId {
            resource: self.resource.to_string(),
        })
    }

    /// The webhook name the notification was delivered for.
    pub fn webhook_name(&self) -> Option<&str> {
        self.raw.get("name").and_then(Value::as_str)
    }

    /// The person who caused the change.
    pub fn actor_id(&self) -> Option<&str> {
        self.raw.get("actorId").and_then(Value::as_str)
    }

    /// The raw notification, unchanged.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Consumes the payload and returns the raw notification.
    pub fn into_raw(self) -> Value {
        self.raw
    }

    /// The resolution strategy for this payload's resource.
    pub fn strategy(&self) -> Strategy {
        match self.resource {
            Resource::AttachmentActions => Strategy::CardInteraction,
            Resource::Messages => Strategy::TextHears,
            _ => Strategy::Generic,
        }
    }
}

impl TryFrom<Value> for WebhookPayload {
    type Error = PayloadError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn tag<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, PayloadError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(""),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(PayloadError::InvalidField { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notification() {
        let payload = WebhookPayload::from_value(json!({
            "id": "wh1",
            "name": "bot_webhook_events",
            "resource": "messages",
            "event": "created",
            "actorId": "p1",
            "data": {"id": "m1", "roomId": "r1"}
        }))
        .unwrap();

        assert_eq!(payload.resource(), &Resource::Messages);
        assert_eq!(payload.event(), &EventKind::Created);
        assert_eq!(payload.data_id(), Some("m1"));
        assert_eq!(payload.webhook_name(), Some("bot_webhook_events"));
        assert_eq!(payload.actor_id(), Some("p1"));
        assert_eq!(payload.strategy(), Strategy::TextHears);
    }

    #[test]
    fn test_unknown_tags_are_kept() {
        let payload = WebhookPayload::from_value(json!({
            "resource": "telephony_calls",
            "event": "answered",
            "data": {}
        }))
        .unwrap();
        assert_eq!(
            payload.resource(),
            &Resource::Other("telephony_calls".into())
        );
        assert_eq!(payload.event().as_str(), "answered");
        assert_eq!(payload.strategy(), Strategy::Generic);
    }

    #[test]
    fn test_missing_fields() {
        let payload = WebhookPayload::from_value(json!({})).unwrap();
        assert_eq!(payload.resource().as_str(), "");
        assert_eq!(payload.data(), &Value::Null);
        assert!(matches!(
            payload.require_data_id(),
            Err(PayloadError::MissingDataId { .. })
        ));
    }

    #[test]
    fn test_invalid_payloads() {
        assert!(matches!(
            WebhookPayload::from_value(json!([1, 2])),
            Err(PayloadError::NotAnObject)
        ));
        assert!(matches!(
            WebhookPayload::from_value(json!({"resource": 7})),
            Err(PayloadError::InvalidField { field: "resource" })
        ));
    }

    #[test]
    fn test_strategy_mapping() {
        let card = WebhookPayload::new(Resource::AttachmentActions, EventKind::Created, json!({}));
        assert_eq!(card.strategy(), Strategy::CardInteraction);
        let member = WebhookPayload::new(Resource::Memberships, EventKind::Created, json!({}));
        assert_eq!(member.strategy(), Strategy::Generic);
        assert_eq!(member.raw()["resource"], "memberships");
    }
}

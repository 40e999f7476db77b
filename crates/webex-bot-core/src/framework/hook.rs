//! Hooks: predicates bound to handlers.
//!
//! A [`Hook`] pairs a predicate with a handler. The predicate is either a
//! resource/event filter (`Hook::on`) or a list of text patterns
//! (`Hook::hears`). Hooks are immutable once built.
//!
//! # Classification
//!
//! [`Hook::classify`] decides whether a notification concerns the hook and
//! resolves it into a domain object. The order is fixed:
//!
//! 1. Card submissions on a hook filtering `attachmentActions` fetch the
//!    attachment action and match. Nothing else is checked.
//! 2. Messages fetch the message and its author. A message the platform will
//!    not return does not match. Messages written by bots never match a
//!    pattern. The hook matches when any pattern is found anywhere in the
//!    text; capture groups are then collected only from patterns that match
//!    at the very start of the text.
//! 3. Otherwise a hook whose resource (and event, if set) equals the
//!    payload's matches with the payload's `data` as-is.
//!
//! # Example
//!
//! ```rust,ignore
//! use webex_bot_core::{Hook, Resource, EventKind};
//!
//! let greet = Hook::hears("hi|hello")?
//!     .description("Say hello")
//!     .handler(say_hi);
//!
//! let joined = Hook::on(Resource::Memberships)
//!     .event(EventKind::Created)
//!     .handler(welcome);
//! ```

use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info, trace};

use crate::error::{ApiError, DispatchError, DispatchResult};
use crate::foundation::context::{Extracted, Groups, HookContext, Matched, Resolved};
use crate::foundation::payload::{EventKind, Resource, Strategy, WebhookPayload};
use crate::framework::handler::{BoxedHandler, Handler, into_handler};
use crate::integration::api::MessagingApi;

// ============================================================================
// Pattern
// ============================================================================

/// A compiled text pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compiles a pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// The pattern source.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns `true` if the pattern occurs anywhere in `text`.
    pub fn is_found(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Matches at the start of `text` and returns the capture groups.
    ///
    /// Group 0 is not included. With leftmost-first semantics, a match at
    /// offset 0 exists exactly when the leftmost match starts there, and it
    /// takes the same alternation branches an anchored match would.
    pub fn match_start(&self, text: &str) -> Option<Groups> {
        let caps = self.regex.captures(text)?;
        if caps.get(0)?.start() != 0 {
            return None;
        }
        Some(
            caps.iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect(),
        )
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Self { regex }
    }
}

// ============================================================================
// Hook
// ============================================================================

/// An immutable registration record.
#[derive(Clone)]
pub struct Hook {
    name: Arc<str>,
    description: String,
    resource: Option<Resource>,
    event: Option<EventKind>,
    patterns: Vec<Pattern>,
    handler: BoxedHandler,
}

/// Outcome of the message branch of classification.
enum Hearing {
    Matched(Matched),
    /// The message or its author could not be fetched.
    Unavailable,
    /// Fetched, but no pattern applies.
    NotHeard,
}

impl Hook {
    /// Starts a hook for notifications about `resource`.
    pub fn on(resource: impl Into<Resource>) -> HookBuilder {
        HookBuilder {
            resource: Some(resource.into()),
            ..HookBuilder::default()
        }
    }

    /// Starts a hook for messages matching `pattern`.
    pub fn hears(pattern: &str) -> Result<HookBuilder, regex::Error> {
        Self::hears_any([pattern])
    }

    /// Starts a hook for messages matching any of `patterns`.
    pub fn hears_any<I, S>(patterns: I) -> Result<HookBuilder, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::hears_patterns(patterns))
    }

    /// Starts a hook for messages matching any of the precompiled `patterns`.
    pub fn hears_patterns(patterns: impl IntoIterator<Item = Pattern>) -> HookBuilder {
        HookBuilder {
            patterns: patterns.into_iter().collect(),
            ..HookBuilder::default()
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-text description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Resource filter, if any.
    pub fn resource(&self) -> Option<&Resource> {
        self.resource.as_ref()
    }

    /// Event filter, if any.
    pub fn event(&self) -> Option<&EventKind> {
        self.event.as_ref()
    }

    /// Text patterns.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Classifies a notification against this hook.
    ///
    /// Returns `Ok(None)` when the hook does not apply. Errors are reserved
    /// for malformed payloads, failed card lookups, and local (non-platform)
    /// failures while fetching a message.
    pub async fn classify(
        &self,
        api: &dyn MessagingApi,
        payload: &WebhookPayload,
    ) -> DispatchResult<Option<Matched>> {
        match payload.strategy() {
            Strategy::CardInteraction if self.resource.as_ref() == Some(payload.resource()) => {
                let id = payload.require_data_id()?;
                info!(hook = %self.name, action_id = id, "Card interaction");
                let action = api
                    .get_attachment_action(id)
                    .await
                    .map_err(|source| self.resolve_error(source))?;
                return Ok(Some(Matched::new(Resolved::AttachmentAction(action))));
            }
            Strategy::TextHears => match self.hear(api, payload).await? {
                Hearing::Matched(matched) => return Ok(Some(matched)),
                Hearing::Unavailable => return Ok(None),
                Hearing::NotHeard => {}
            },
            _ => {}
        }

        if self.filter_matches(payload) {
            info!(
                hook = %self.name,
                resource = %payload.resource(),
                event = %payload.event(),
                "Resource event"
            );
            return Ok(Some(Matched::new(Resolved::Data(payload.data().clone()))));
        }

        Ok(None)
    }

    /// Runs the handler.
    pub async fn invoke(&self, ctx: HookContext) -> DispatchResult<()> {
        (self.handler)(ctx)
            .await
            .map_err(|source| DispatchError::Handler {
                hook: self.name.to_string(),
                source,
            })
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    fn filter_matches(&self, payload: &WebhookPayload) -> bool {
        let Some(resource) = &self.resource else {
            return false;
        };
        resource == payload.resource()
            && self.event.as_ref().is_none_or(|e| e == payload.event())
    }

    async fn hear(
        &self,
        api: &dyn MessagingApi,
        payload: &WebhookPayload,
    ) -> DispatchResult<Hearing> {
        let id = payload.require_data_id()?;

        let message = match api.get_message(id).await {
            Ok(message) => message,
            Err(e) if e.is_remote() => {
                debug!(hook = %self.name, message_id = id, error = %e, "Message unavailable");
                return Ok(Hearing::Unavailable);
            }
            Err(e) => return Err(self.resolve_error(e)),
        };

        let Some(author_id) = message.person_id.as_deref() else {
            debug!(hook = %self.name, message_id = id, "Message has no author");
            return Ok(Hearing::Unavailable);
        };

        let author = match api.get_person(author_id).await {
            Ok(person) => person,
            Err(e) if e.is_remote() => {
                debug!(hook = %self.name, person_id = author_id, error = %e, "Author unavailable");
                return Ok(Hearing::Unavailable);
            }
            Err(e) => return Err(self.resolve_error(e)),
        };

        if author.is_bot() {
            trace!(hook = %self.name, person_id = author_id, "Ignoring message from bot account");
            return Ok(Hearing::NotHeard);
        }

        let text = message.text();
        if !self.patterns.iter().any(|p| p.is_found(text)) {
            trace!(hook = %self.name, "No pattern found in message");
            return Ok(Hearing::NotHeard);
        }

        let groups = self
            .patterns
            .iter()
            .filter_map(|p| p.match_start(text))
            .collect();

        info!(hook = %self.name, text = text, "Message matches");
        Ok(Hearing::Matched(Matched {
            resolved: Resolved::Message(message),
            extracted: Extracted::with_groups(groups),
        }))
    }

    fn resolve_error(&self, source: ApiError) -> DispatchError {
        DispatchError::Resolve {
            hook: self.name.to_string(),
            source,
        }
    }
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("resource", &self.resource)
            .field("event", &self.event)
            .field(
                "patterns",
                &self.patterns.iter().map(Pattern::as_str).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ============================================================================
// HookBuilder
// ============================================================================

/// Builder returned by [`Hook::on`] and [`Hook::hears`].
///
/// [`HookBuilder::handler`] finishes the hook.
#[derive(Debug, Default)]
pub struct HookBuilder {
    resource: Option<Resource>,
    event: Option<EventKind>,
    patterns: Vec<Pattern>,
    name: Option<String>,
    description: String,
}

impl HookBuilder {
    /// Restricts a resource hook to one event.
    pub fn event(mut self, event: impl Into<EventKind>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Sets the name. Defaults to the pattern sources joined by `/`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the description shown in help output.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Binds the handler and builds the hook.
    pub fn handler<F, T>(self, f: F) -> Hook
    where
        F: Handler<T>,
        T: 'static,
    {
        let name = self.name.unwrap_or_else(|| {
            self.patterns
                .iter()
                .map(Pattern::as_str)
                .collect::<Vec<_>>()
                .join("/")
        });

        Hook {
            name: name.into(),
            description: self.description,
            resource: self.resource,
            event: self.event,
            patterns: self.patterns,
            handler: into_handler(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;
    use serde_json::json;

    async fn noop() {}

    fn message_payload(id: &str) -> WebhookPayload {
        WebhookPayload::new(Resource::Messages, EventKind::Created, json!({ "id": id }))
    }

    #[test]
    fn test_pattern_search_and_start() {
        let p = Pattern::new("hi|hello").unwrap();
        assert!(p.is_found("say hi!"));
        assert_eq!(p.match_start("say hi!"), None);
        assert_eq!(p.match_start("hello there"), Some(vec![]));

        let p = Pattern::new(r"echo (\w+)( loud)?").unwrap();
        assert_eq!(
            p.match_start("echo bob"),
            Some(vec![Some("bob".to_string()), None])
        );
    }

    #[test]
    fn test_default_name() {
        let hook = Hook::hears_any(["hi", "hello"]).unwrap().handler(noop);
        assert_eq!(hook.name(), "hi/hello");
        assert_eq!(hook.description(), "");

        let hook = Hook::hears("help")
            .unwrap()
            .name("help")
            .description("Show help")
            .handler(noop);
        assert_eq!(hook.name(), "help");
        assert_eq!(hook.description(), "Show help");
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(Hook::hears("(unclosed").is_err());
    }

    #[tokio::test]
    async fn test_hears_anchored_match() {
        let api = MockApi::new().with_message("m1", "p1", "hello there");
        let hook = Hook::hears("hi|hello").unwrap().handler(noop);

        let matched = hook
            .classify(&api, &message_payload("m1"))
            .await
            .unwrap()
            .expect("hook should match");

        assert_eq!(matched.resolved.as_message().unwrap().id, "m1");
        assert_eq!(matched.extracted.groups, Some(vec![vec![]]));
    }

    #[tokio::test]
    async fn test_hears_unanchored_match_has_no_groups() {
        let api = MockApi::new().with_message("m1", "p1", "say hi!");
        let hook = Hook::hears("hi|hello").unwrap().handler(noop);

        let matched = hook
            .classify(&api, &message_payload("m1"))
            .await
            .unwrap()
            .expect("hook should match");

        assert_eq!(matched.extracted.groups, Some(vec![]));
    }

    #[tokio::test]
    async fn test_hears_ignores_bots() {
        let api = MockApi::new()
            .with_message("m1", "b1", "hi everyone")
            .with_person("b1", "echo@webex.bot");
        let hook = Hook::hears("hi|hello").unwrap().handler(noop);

        let result = hook.classify(&api, &message_payload("m1")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_hears_groups_follow_pattern_order() {
        let api = MockApi::new().with_message("m1", "p1", "add 3 apples");
        let hook = Hook::hears_any([r"add (\d+) (\w+)", r"apples", r"(add) (\d)"])
            .unwrap()
            .handler(noop);

        let matched = hook
            .classify(&api, &message_payload("m1"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            matched.extracted.groups,
            Some(vec![
                vec![Some("3".into()), Some("apples".into())],
                vec![Some("add".into()), Some("3".into())],
            ])
        );
    }

    #[tokio::test]
    async fn test_hears_no_pattern_found() {
        let api = MockApi::new().with_message("m1", "p1", "good morning");
        let hook = Hook::hears("hi|hello").unwrap().handler(noop);
        assert!(
            hook.classify(&api, &message_payload("m1"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_hears_missing_message_is_no_match() {
        let api = MockApi::new();
        let hook = Hook::hears(".*").unwrap().handler(noop);
        assert!(
            hook.classify(&api, &message_payload("gone"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_hears_missing_author_is_no_match() {
        let api = MockApi::new()
            .with_message("m1", "p1", "hi there")
            .without_person("p1");
        let hook = Hook::hears("hi").unwrap().handler(noop);
        assert!(
            hook.classify(&api, &message_payload("m1"))
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(api.calls(), vec!["get_message m1", "get_person p1"]);
    }

    #[tokio::test]
    async fn test_hears_local_failure_propagates() {
        let api = MockApi::new().failing_with(ApiError::Transport("connection reset".into()));
        let hook = Hook::hears(".*").unwrap().handler(noop);
        let err = hook
            .classify(&api, &message_payload("m1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Resolve { .. }));
    }

    #[tokio::test]
    async fn test_card_interaction() {
        let api = MockApi::new().with_action("a1", json!({"choice": "yes"}));
        let hook = Hook::on(Resource::AttachmentActions).handler(noop);
        let payload =
            WebhookPayload::new(Resource::AttachmentActions, EventKind::Created, json!({"id": "a1"}));

        let matched = hook.classify(&api, &payload).await.unwrap().unwrap();
        let action = matched.resolved.as_attachment_action().unwrap();
        assert_eq!(action.input("choice"), Some("yes"));
        assert!(matched.extracted.is_empty());
    }

    #[tokio::test]
    async fn test_card_interaction_ignores_event_filter() {
        let api = MockApi::new().with_action("a1", json!({}));
        let hook = Hook::on(Resource::AttachmentActions)
            .event(EventKind::Deleted)
            .handler(noop);
        let payload =
            WebhookPayload::new(Resource::AttachmentActions, EventKind::Created, json!({"id": "a1"}));
        assert!(hook.classify(&api, &payload).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_card_fetch_failure_propagates() {
        let api = MockApi::new();
        let hook = Hook::on(Resource::AttachmentActions).handler(noop);
        let payload =
            WebhookPayload::new(Resource::AttachmentActions, EventKind::Created, json!({"id": "a9"}));
        assert!(matches!(
            hook.classify(&api, &payload).await,
            Err(DispatchError::Resolve { .. })
        ));
    }

    #[tokio::test]
    async fn test_text_hook_ignores_cards() {
        let api = MockApi::new().with_action("a1", json!({}));
        let hook = Hook::hears(".*").unwrap().handler(noop);
        let payload =
            WebhookPayload::new(Resource::AttachmentActions, EventKind::Created, json!({"id": "a1"}));
        assert!(hook.classify(&api, &payload).await.unwrap().is_none());
        assert_eq!(api.calls(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_resource_event_filter() {
        let api = MockApi::new();
        let data = json!({"id": "mb1", "personEmail": "new@example.com"});
        let created = WebhookPayload::new(Resource::Memberships, EventKind::Created, data.clone());
        let deleted = WebhookPayload::new(Resource::Memberships, EventKind::Deleted, data.clone());
        let rooms = WebhookPayload::new(Resource::Rooms, EventKind::Created, data.clone());

        let hook = Hook::on("memberships").event("created").handler(noop);
        let matched = hook.classify(&api, &created).await.unwrap().unwrap();
        assert_eq!(matched.resolved, Resolved::Data(data.clone()));
        assert!(matched.extracted.is_empty());
        assert!(hook.classify(&api, &deleted).await.unwrap().is_none());
        assert!(hook.classify(&api, &rooms).await.unwrap().is_none());

        let any_event = Hook::on(Resource::Memberships).handler(noop);
        assert!(any_event.classify(&api, &deleted).await.unwrap().is_some());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_message_resource_hook_falls_through() {
        let api = MockApi::new().with_message("m1", "p1", "anything");
        let hook = Hook::on(Resource::Messages).handler(noop);

        let matched = hook
            .classify(&api, &message_payload("m1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(matched.resolved, Resolved::Data(json!({"id": "m1"})));
    }

    #[tokio::test]
    async fn test_classify_is_repeatable() {
        let api = MockApi::new().with_message("m1", "p1", "hello hello");
        let hook = Hook::hears("(hel)lo").unwrap().handler(noop);
        let payload = message_payload("m1");

        let first = hook.classify(&api, &payload).await.unwrap();
        let second = hook.classify(&api, &payload).await.unwrap();
        assert_eq!(first, second);
    }
}

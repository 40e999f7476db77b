//! In-memory [`MessagingApi`] for tests.
//!
//! Enabled for this crate's tests and, for downstream crates, through the
//! `testing` feature.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::foundation::model::{AttachmentAction, Message, NewMessage, NewWebhook, Person, Webhook};
use crate::integration::api::MessagingApi;

#[derive(Default)]
struct State {
    messages: HashMap<String, Message>,
    people: HashMap<String, Person>,
    actions: HashMap<String, AttachmentAction>,
    webhooks: Vec<Webhook>,
    rejected_webhooks: HashMap<String, ApiError>,
    sent: Vec<NewMessage>,
    calls: Vec<String>,
    next_id: usize,
}

/// A scripted platform.
///
/// Unknown IDs yield [`ApiError::NotFound`]. Every call is recorded as
/// `"<operation> <argument>"`.
#[derive(Default)]
pub struct MockApi {
    state: Mutex<State>,
    failure: Option<ApiError>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message. Its author is added as a human if not already known.
    pub fn with_message(self, id: &str, person_id: &str, text: &str) -> Self {
        {
            let mut state = self.state.lock();
            state.messages.insert(
                id.to_string(),
                Message {
                    id: id.to_string(),
                    room_id: Some("room-1".to_string()),
                    text: Some(text.to_string()),
                    person_id: Some(person_id.to_string()),
                    ..Message::default()
                },
            );
            state
                .people
                .entry(person_id.to_string())
                .or_insert_with(|| person(person_id, &format!("{person_id}@example.com")));
        }
        self
    }

    /// Adds or replaces a person.
    pub fn with_person(self, id: &str, email: &str) -> Self {
        self.state
            .lock()
            .people
            .insert(id.to_string(), person(id, email));
        self
    }

    /// Removes a person, leaving their messages without a known author.
    pub fn without_person(self, id: &str) -> Self {
        self.state.lock().people.remove(id);
        self
    }

    /// Adds a card submission with the given inputs.
    pub fn with_action(self, id: &str, inputs: Value) -> Self {
        let inputs = match inputs {
            Value::Object(map) => map,
            _ => Default::default(),
        };
        self.state.lock().actions.insert(
            id.to_string(),
            AttachmentAction {
                id: id.to_string(),
                kind: Some("submit".to_string()),
                inputs,
                room_id: Some("room-1".to_string()),
                ..AttachmentAction::default()
            },
        );
        self
    }

    /// Adds an already registered webhook.
    pub fn with_webhook(self, id: &str, name: &str) -> Self {
        self.state.lock().webhooks.push(Webhook {
            id: id.to_string(),
            name: name.to_string(),
            ..Webhook::default()
        });
        self
    }

    /// Makes creating the webhook named `name` fail with `error`.
    pub fn rejecting_webhook(self, name: &str, error: ApiError) -> Self {
        self.state
            .lock()
            .rejected_webhooks
            .insert(name.to_string(), error);
        self
    }

    /// Makes every call fail with `error`.
    pub fn failing_with(mut self, error: ApiError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Calls made so far.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Messages posted so far.
    pub fn sent(&self) -> Vec<NewMessage> {
        self.state.lock().sent.clone()
    }

    /// Webhooks currently registered.
    pub fn webhooks(&self) -> Vec<Webhook> {
        self.state.lock().webhooks.clone()
    }

    fn record(&self, call: String) -> ApiResult<()> {
        self.state.lock().calls.push(call);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn person(id: &str, email: &str) -> Person {
    Person {
        id: id.to_string(),
        emails: vec![email.to_string()],
        display_name: Some(id.to_string()),
        ..Person::default()
    }
}

fn not_found(resource: &'static str, id: &str) -> ApiError {
    ApiError::NotFound {
        resource,
        id: id.to_string(),
    }
}

#[async_trait]
impl MessagingApi for MockApi {
    async fn get_message(&self, id: &str) -> ApiResult<Message> {
        self.record(format!("get_message {id}"))?;
        self.state
            .lock()
            .messages
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("messages", id))
    }

    async fn get_person(&self, id: &str) -> ApiResult<Person> {
        self.record(format!("get_person {id}"))?;
        self.state
            .lock()
            .people
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("people", id))
    }

    async fn get_attachment_action(&self, id: &str) -> ApiResult<AttachmentAction> {
        self.record(format!("get_attachment_action {id}"))?;
        self.state
            .lock()
            .actions
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("attachment/actions", id))
    }

    async fn create_message(&self, message: &NewMessage) -> ApiResult<Message> {
        self.record(format!(
            "create_message {}",
            message.room_id.as_deref().unwrap_or_default()
        ))?;
        let mut state = self.state.lock();
        state.next_id += 1;
        state.sent.push(message.clone());
        Ok(Message {
            id: format!("sent-{}", state.next_id),
            room_id: message.room_id.clone(),
            text: message.text.clone(),
            markdown: message.markdown.clone(),
            attachments: message.attachments.clone(),
            ..Message::default()
        })
    }

    async fn list_webhooks(&self) -> ApiResult<Vec<Webhook>> {
        self.record("list_webhooks".to_string())?;
        Ok(self.state.lock().webhooks.clone())
    }

    async fn create_webhook(&self, webhook: &NewWebhook) -> ApiResult<Webhook> {
        self.record(format!("create_webhook {}", webhook.name))?;
        let mut state = self.state.lock();
        if let Some(err) = state.rejected_webhooks.get(&webhook.name) {
            return Err(err.clone());
        }
        state.next_id += 1;
        let created = Webhook {
            id: format!("wh-{}", state.next_id),
            name: webhook.name.clone(),
            target_url: webhook.target_url.clone(),
            resource: webhook.resource.clone(),
            event: webhook.event.clone(),
            filter: webhook.filter.clone(),
            status: Some("active".to_string()),
            created: None,
        };
        state.webhooks.push(created.clone());
        Ok(created)
    }

    async fn delete_webhook(&self, id: &str) -> ApiResult<()> {
        self.record(format!("delete_webhook {id}"))?;
        let mut state = self.state.lock();
        let before = state.webhooks.len();
        state.webhooks.retain(|w| w.id != id);
        if state.webhooks.len() == before {
            return Err(not_found("webhooks", id));
        }
        Ok(())
    }
}

//! The messaging platform API seen by the hook engine.
//!
//! The engine only reads (`get_*`); the write operations are here so handlers
//! and the runtime can reply and manage webhooks through the same handle.
//! `webex-bot-transport` provides the REST implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::foundation::model::{AttachmentAction, Message, NewMessage, NewWebhook, Person, Webhook};

/// Operations the framework needs from the messaging platform.
///
/// Every call is a single attempt; implementations must not retry.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Fetches a message by ID.
    async fn get_message(&self, id: &str) -> ApiResult<Message>;

    /// Fetches a person by ID.
    async fn get_person(&self, id: &str) -> ApiResult<Person>;

    /// Fetches a card submission by ID.
    async fn get_attachment_action(&self, id: &str) -> ApiResult<AttachmentAction>;

    /// Posts a message.
    async fn create_message(&self, message: &NewMessage) -> ApiResult<Message>;

    /// Lists the webhooks registered by this bot.
    async fn list_webhooks(&self) -> ApiResult<Vec<Webhook>>;

    /// Registers a webhook.
    async fn create_webhook(&self, webhook: &NewWebhook) -> ApiResult<Webhook>;

    /// Deletes a webhook.
    async fn delete_webhook(&self, id: &str) -> ApiResult<()>;
}

/// A shared platform API handle.
pub type BoxedApi = Arc<dyn MessagingApi>;

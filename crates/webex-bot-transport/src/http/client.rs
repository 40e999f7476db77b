//! REST implementation of [`MessagingApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use webex_bot_core::{
    ApiError, ApiResult, AttachmentAction, Message, MessagingApi, NewMessage, NewWebhook, Person,
    TransportError, TransportResult, Webhook,
};

/// Public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://webexapis.com/v1";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// List responses wrap their entries in `items`.
#[derive(Deserialize)]
struct Items<T> {
    items: Vec<T>,
}

/// A bearer-authenticated REST client.
///
/// Every call is a single attempt.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    token: String,
}

impl RestClient {
    /// Creates a client for the public API with default settings.
    pub fn new(access_token: impl Into<String>) -> TransportResult<Self> {
        Self::builder(access_token).build()
    }

    /// Starts a client builder.
    pub fn builder(access_token: impl Into<String>) -> RestClientBuilder {
        RestClientBuilder {
            token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// The base URL requests are made against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// URL of one entity. The ID is always a single, escaped path segment.
    fn entity_url(&self, resource: &'static str, id: &str) -> ApiResult<Url> {
        if id.is_empty() || id == "." || id == ".." {
            return Err(ApiError::NotFound {
                resource,
                id: id.to_string(),
            });
        }

        let mut url = Url::parse(&self.base_url).map_err(|e| ApiError::Transport(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Transport(format!("invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(resource.split('/'))
            .push(id);
        Ok(url)
    }

    async fn send(&self, req: RequestBuilder) -> ApiResult<Response> {
        req.bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))
    }

    async fn get_entity<T: DeserializeOwned>(&self, resource: &'static str, id: &str) -> ApiResult<T> {
        let url = self.entity_url(resource, id)?;
        trace!(url = %url, "GET");
        let resp = self.send(self.client.get(url)).await?;
        let resp = check(resp, resource, id).await?;
        decode(resp).await
    }
}

/// Builder for [`RestClient`].
#[derive(Debug, Clone)]
pub struct RestClientBuilder {
    token: String,
    base_url: String,
    timeout: Duration,
}

impl RestClientBuilder {
    /// Overrides the API base URL. A trailing slash is ignored.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client.
    pub fn build(self) -> TransportResult<RestClient> {
        let client = ClientBuilder::new()
            .timeout(self.timeout)
            .build()
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;

        Ok(RestClient {
            client,
            base_url: self.base_url,
            token: self.token,
        })
    }
}

/// Maps non-success statuses to [`ApiError`].
async fn check(resp: Response, resource: &'static str, id: &str) -> ApiResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound {
            resource,
            id: id.to_string(),
        });
    }

    let body = resp.text().await.unwrap_or_default();
    let message = error_message(&body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_default();
    debug!(status = status.as_u16(), resource, message = %message, "API request rejected");
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> ApiResult<T> {
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Error bodies carry a `message` field; fall back to the raw text.
fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => Some(parsed.message),
        Err(_) => Some(body.trim().to_string()),
    }
}

#[async_trait]
impl MessagingApi for RestClient {
    async fn get_message(&self, id: &str) -> ApiResult<Message> {
        self.get_entity("messages", id).await
    }

    async fn get_person(&self, id: &str) -> ApiResult<Person> {
        self.get_entity("people", id).await
    }

    async fn get_attachment_action(&self, id: &str) -> ApiResult<AttachmentAction> {
        self.get_entity("attachment/actions", id).await
    }

    async fn create_message(&self, message: &NewMessage) -> ApiResult<Message> {
        let resp = self
            .send(self.client.post(self.url("messages")).json(message))
            .await?;
        let resp = check(resp, "messages", "").await?;
        decode(resp).await
    }

    async fn list_webhooks(&self) -> ApiResult<Vec<Webhook>> {
        let resp = self.send(self.client.get(self.url("webhooks"))).await?;
        let resp = check(resp, "webhooks", "").await?;
        let list: Items<Webhook> = decode(resp).await?;
        Ok(list.items)
    }

    async fn create_webhook(&self, webhook: &NewWebhook) -> ApiResult<Webhook> {
        let resp = self
            .send(self.client.post(self.url("webhooks")).json(webhook))
            .await?;
        let resp = check(resp, "webhooks", "").await?;
        decode(resp).await
    }

    async fn delete_webhook(&self, id: &str) -> ApiResult<()> {
        let url = self.entity_url("webhooks", id)?;
        let resp = self.send(self.client.delete(url)).await?;
        check(resp, "webhooks", id).await?;
        Ok(())
    }
}

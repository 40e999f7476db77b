//! Bot lifecycle: setup, hook registration, webhook management and serving.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use webex_bot_runtime::WebexBot;
//!
//! // Loads webexbot.toml from the current directory plus WEBEX_BOT_* env vars
//! let mut bot = WebexBot::builder().build()?;
//!
//! bot.hears("hi|hello", greet)?;
//! bot.hears_help("help", "Show this message")?;
//!
//! // Registers the webhooks and serves until Ctrl+C
//! bot.run().await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigLoader, WebexBotConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::helpers;
use crate::logging;
use webex_bot_core::{
    BoxedApi, Dispatcher, EventKind, Handler, Hook, Message, NewWebhook, Resource,
};
use webex_bot_transport::{
    RestClient, attachment_actions_path, bind, events_path, router, serve,
};

/// Name of the webhook receiving every resource notification.
pub const EVENTS_WEBHOOK_NAME: &str = "bot_webhook_events";

/// Name of the webhook receiving card submissions.
pub const ATTACHMENT_ACTIONS_WEBHOOK_NAME: &str = "bot_webhook_aa";

/// A webhook-driven bot.
///
/// Owns the configuration, the platform API handle and the [`Dispatcher`].
/// Hooks are registered before [`run`](Self::run); the dispatcher is frozen
/// into the webhook server when it starts.
pub struct WebexBot {
    config: WebexBotConfig,
    api: BoxedApi,
    dispatcher: Dispatcher,
    /// IDs of the webhooks created by this bot.
    webhooks: Mutex<Vec<String>>,
    /// Help message, rebuilt on every registration.
    help: Arc<RwLock<String>>,
}

impl WebexBot {
    /// Creates a bot builder.
    pub fn builder() -> WebexBotBuilder {
        WebexBotBuilder::new()
    }

    /// Creates a bot from configuration.
    ///
    /// Initializes logging and builds the REST client.
    pub fn from_config(config: WebexBotConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;
        logging::init_from_config(&config.logging);

        let client = RestClient::builder(config.bot.access_token.clone())
            .base_url(config.api.base_url.clone())
            .timeout(config.api.timeout())
            .build()?;

        info!(
            bot = %config.bot.name,
            log_level = %config.logging.level,
            api = %config.api.base_url,
            "Bot initialized from configuration"
        );

        Ok(Self::with_api(config, Arc::new(client)))
    }

    /// Creates a bot using `api` instead of the REST client.
    pub fn with_api(config: WebexBotConfig, api: BoxedApi) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(&api)).with_label(config.bot.name.clone());
        Self {
            config,
            api,
            dispatcher,
            webhooks: Mutex::new(Vec::new()),
            help: Arc::new(RwLock::new(helpers::help_text(&[]))),
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &WebexBotConfig {
        &self.config
    }

    /// The bot name.
    pub fn name(&self) -> &str {
        &self.config.bot.name
    }

    /// The platform API handle.
    pub fn api(&self) -> &BoxedApi {
        &self.api
    }

    /// The dispatcher holding the registered hooks.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the number of registered hooks.
    pub fn hook_count(&self) -> usize {
        self.dispatcher.hook_count()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Appends a hook. Hooks are evaluated in registration order.
    pub fn register(&mut self, hook: Hook) -> &mut Self {
        self.dispatcher.register(hook);
        *self.help.write() = helpers::help_text(self.dispatcher.hooks());
        self
    }

    /// Registers `handler` for every notification about `resource`.
    pub fn on<F, T>(&mut self, resource: impl Into<Resource>, handler: F) -> &mut Self
    where
        F: Handler<T>,
        T: 'static,
    {
        self.register(Hook::on(resource).handler(handler))
    }

    /// Registers `handler` for `event` notifications about `resource`.
    pub fn on_event<F, T>(
        &mut self,
        resource: impl Into<Resource>,
        event: impl Into<EventKind>,
        handler: F,
    ) -> &mut Self
    where
        F: Handler<T>,
        T: 'static,
    {
        self.register(Hook::on(resource).event(event).handler(handler))
    }

    /// Registers `handler` for messages matching `pattern`.
    pub fn hears<F, T>(&mut self, pattern: &str, handler: F) -> RuntimeResult<&mut Self>
    where
        F: Handler<T>,
        T: 'static,
    {
        let hook = Hook::hears(pattern)?.handler(handler);
        Ok(self.register(hook))
    }

    /// Registers `handler` for messages matching any of `patterns`.
    pub fn hears_any<I, S, F, T>(&mut self, patterns: I, handler: F) -> RuntimeResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Handler<T>,
        T: 'static,
    {
        let hook = Hook::hears_any(patterns)?.handler(handler);
        Ok(self.register(hook))
    }

    /// Registers a hook answering `pattern` with the list of every hook's
    /// name and description.
    pub fn hears_help(&mut self, pattern: &str, description: &str) -> RuntimeResult<&mut Self> {
        let help = Arc::clone(&self.help);
        let hook = Hook::hears(pattern)?
            .description(description)
            .handler(move |message: Message, api: BoxedApi| {
                let text = help.read().clone();
                async move { helpers::send_help(api.as_ref(), &message, &text).await }
            });
        Ok(self.register(hook))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// The current help message.
    pub fn help_text(&self) -> String {
        self.help.read().clone()
    }

    /// Posts an adaptive card to a room.
    pub async fn send_card(&self, room_id: &str, card: Value) -> RuntimeResult<Message> {
        Ok(helpers::send_card(self.api.as_ref(), room_id, card).await?)
    }

    /// Replies to `source` with the help message.
    pub async fn send_help(&self, source: &Message) -> RuntimeResult<Message> {
        let text = self.help_text();
        Ok(helpers::send_help(self.api.as_ref(), source, &text).await?)
    }

    // =========================================================================
    // Webhook Management
    // =========================================================================

    /// The public base URL webhooks are delivered to.
    pub fn public_url(&self) -> RuntimeResult<String> {
        let tunnel = &self.config.tunnel;
        let url = tunnel
            .public_url
            .as_deref()
            .ok_or(RuntimeError::MissingPublicUrl)?
            .trim_end_matches('/');

        Ok(match url.strip_prefix("http://") {
            Some(rest) if tunnel.force_https => format!("https://{rest}"),
            _ => url.to_string(),
        })
    }

    /// Registers the bot's two webhooks, first deleting the existing ones
    /// when `webhooks.cleanup_existing` is set.
    pub async fn setup_webhooks(&self) -> RuntimeResult<()> {
        let public_url = self.public_url()?;

        if self.config.webhooks.cleanup_existing {
            let existing = self.api.list_webhooks().await?;
            for webhook in existing {
                self.api.delete_webhook(&webhook.id).await?;
                debug!(webhook = %webhook.name, id = %webhook.id, "Deleted existing webhook");
            }
        }

        let name = self.name();
        let requests = [
            NewWebhook {
                name: EVENTS_WEBHOOK_NAME.to_string(),
                target_url: format!("{public_url}{}", events_path(name)),
                resource: Resource::All.to_string(),
                event: EventKind::All.to_string(),
                filter: None,
                secret: None,
            },
            NewWebhook {
                name: ATTACHMENT_ACTIONS_WEBHOOK_NAME.to_string(),
                target_url: format!("{public_url}{}", attachment_actions_path(name)),
                resource: Resource::AttachmentActions.to_string(),
                event: EventKind::All.to_string(),
                filter: None,
                secret: None,
            },
        ];

        for request in &requests {
            let webhook = self.api.create_webhook(request).await?;
            info!(
                webhook = %webhook.name,
                target = %webhook.target_url,
                "Registered webhook"
            );
            self.webhooks.lock().push(webhook.id);
        }

        Ok(())
    }

    /// Deletes the webhooks created by [`setup_webhooks`](Self::setup_webhooks).
    ///
    /// Every webhook is attempted; the first failure is returned.
    pub async fn remove_webhooks(&self) -> RuntimeResult<()> {
        let ids = std::mem::take(&mut *self.webhooks.lock());
        let mut result = Ok(());

        for id in ids {
            match self.api.delete_webhook(&id).await {
                Ok(()) => debug!(id = %id, "Removed webhook"),
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to remove webhook");
                    if result.is_ok() {
                        result = Err(e.into());
                    }
                }
            }
        }

        result
    }

    // =========================================================================
    // Serving
    // =========================================================================

    /// Runs the bot until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Runs the bot until `shutdown` resolves.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = bind(&self.config.server.bind_addr()).await?;
        self.run_with_listener(listener, shutdown).await
    }

    /// Runs the bot on an already bound listener until `shutdown` resolves.
    pub async fn run_with_listener<F>(&self, listener: TcpListener, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Err(e) = self.setup_webhooks().await {
            self.cleanup_webhooks().await;
            return Err(e);
        }

        info!(
            bot = %self.name(),
            hooks = self.hook_count(),
            "Bot is now running. Press Ctrl+C to stop."
        );

        let app = router(self.name(), Arc::new(self.dispatcher.clone()));
        let served = serve(listener, app, shutdown).await;
        self.cleanup_webhooks().await;

        served?;
        info!(bot = %self.name(), "Bot stopped");
        Ok(())
    }

    /// Removes this run's webhooks if `webhooks.remove_on_shutdown` is set.
    async fn cleanup_webhooks(&self) {
        if self.config.webhooks.remove_on_shutdown
            && let Err(e) = self.remove_webhooks().await
        {
            error!(error = %e, "Error during webhook cleanup");
        }
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                wait_for_ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = wait_for_ctrl_c() => {}
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            // Keep serving; SIGTERM or the process supervisor still apply.
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// WebexBotBuilder
// =============================================================================

/// Builder for creating a [`WebexBot`] from configuration sources.
///
/// ```rust,ignore
/// let bot = WebexBot::builder()
///     .config_file("config/production.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct WebexBotBuilder {
    config_loader: ConfigLoader,
}

impl WebexBotBuilder {
    /// Creates a builder searching the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration under the file and environment sources.
    pub fn merge(mut self, config: WebexBotConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration and builds the bot.
    pub fn build(self) -> RuntimeResult<WebexBot> {
        let config = self.config_loader.load()?;
        WebexBot::from_config(config)
    }
}

impl Default for WebexBotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use webex_bot_core::Captures;
    use webex_bot_core::testing::MockApi;

    fn config() -> WebexBotConfig {
        let mut config = WebexBotConfig::default();
        config.bot.name = "testbot".to_string();
        config.bot.access_token = "token".to_string();
        config.tunnel.public_url = Some("http://abc.example/".to_string());
        config
    }

    fn bot_with(config: WebexBotConfig, api: MockApi) -> (WebexBot, Arc<MockApi>) {
        let api = Arc::new(api);
        let bot = WebexBot::with_api(config, api.clone());
        (bot, api)
    }

    fn message_payload(id: &str) -> Value {
        json!({"resource": "messages", "event": "created", "data": {"id": id}})
    }

    async fn noop() {}

    #[test]
    fn test_public_url() {
        let (bot, _) = bot_with(config(), MockApi::new());
        assert_eq!(bot.public_url().unwrap(), "https://abc.example");

        let mut plain = config();
        plain.tunnel.force_https = false;
        let (bot, _) = bot_with(plain, MockApi::new());
        assert_eq!(bot.public_url().unwrap(), "http://abc.example");

        let mut missing = config();
        missing.tunnel.public_url = None;
        let (bot, _) = bot_with(missing, MockApi::new());
        assert!(matches!(bot.public_url(), Err(RuntimeError::MissingPublicUrl)));
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut config = config();
        config.bot.access_token.clear();
        assert!(matches!(
            WebexBot::from_config(config),
            Err(RuntimeError::Config(_))
        ));
    }

    #[test]
    fn test_registration_order_and_help() {
        let (mut bot, _) = bot_with(config(), MockApi::new());
        bot.hears("hi|hello", noop).unwrap();
        bot.on("memberships", noop);
        bot.on_event("rooms", "created", noop);
        bot.hears_help("help", "Show this message").unwrap();

        let names: Vec<_> = bot.dispatcher().hooks().iter().map(Hook::name).collect();
        assert_eq!(names, vec!["hi|hello", "", "", "help"]);
        assert_eq!(bot.hook_count(), 4);
        assert!(bot.help_text().ends_with("\n**help**\n\tShow this message"));
    }

    #[test]
    fn test_hears_invalid_pattern() {
        let (mut bot, _) = bot_with(config(), MockApi::new());
        assert!(matches!(
            bot.hears("(unclosed", noop),
            Err(RuntimeError::Pattern(_))
        ));
        assert_eq!(bot.hook_count(), 0);
    }

    #[tokio::test]
    async fn test_help_hook_replies() {
        let api = MockApi::new().with_message("m1", "p1", "help");
        let (mut bot, api) = bot_with(config(), api);
        bot.hears("hi", noop).unwrap();
        bot.hears_help("help", "Show this message").unwrap();

        let fired = bot.dispatcher().dispatch_value(message_payload("m1")).await.unwrap();
        assert_eq!(fired, 1);

        let sent = api.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].room_id.as_deref(), Some("room-1"));
        assert_eq!(
            sent[0].markdown.as_deref(),
            Some("Here are some commands I understand:\n**hi**\n\t\n**help**\n\tShow this message")
        );
    }

    #[tokio::test]
    async fn test_hears_any_with_captures() {
        let api = MockApi::new().with_message("m1", "p1", "echo hello");
        let (mut bot, _) = bot_with(config(), api);
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        bot.hears_any(["say (.*)", "echo (.*)"], move |groups: Captures| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock() = groups.first().map(str::to_string);
            }
        })
        .unwrap();

        bot.dispatcher().dispatch_value(message_payload("m1")).await.unwrap();
        assert_eq!(seen.lock().clone(), Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_setup_webhooks_replaces_existing() {
        let api = MockApi::new()
            .with_webhook("old-1", "stale")
            .with_webhook("old-2", "bot_webhook_events");
        let (bot, api) = bot_with(config(), api);

        bot.setup_webhooks().await.unwrap();

        let webhooks = api.webhooks();
        assert_eq!(webhooks.len(), 2);
        assert_eq!(webhooks[0].name, EVENTS_WEBHOOK_NAME);
        assert_eq!(webhooks[0].target_url, "https://abc.example/testbot/events");
        assert_eq!(webhooks[0].resource, "all");
        assert_eq!(webhooks[0].event, "all");
        assert_eq!(webhooks[1].name, ATTACHMENT_ACTIONS_WEBHOOK_NAME);
        assert_eq!(
            webhooks[1].target_url,
            "https://abc.example/testbot/attachmentActions"
        );
        assert_eq!(webhooks[1].resource, "attachmentActions");

        assert_eq!(
            &api.calls()[..3],
            ["list_webhooks", "delete_webhook old-1", "delete_webhook old-2"]
        );
    }

    #[tokio::test]
    async fn test_setup_webhooks_keeps_existing() {
        let mut config = config();
        config.webhooks.cleanup_existing = false;
        let (bot, api) = bot_with(config, MockApi::new().with_webhook("old-1", "stale"));

        bot.setup_webhooks().await.unwrap();

        assert_eq!(api.webhooks().len(), 3);
        assert!(!api.calls().iter().any(|c| c == "list_webhooks"));
    }

    #[tokio::test]
    async fn test_setup_requires_public_url() {
        let mut config = config();
        config.tunnel.public_url = None;
        let (bot, api) = bot_with(config, MockApi::new());

        assert!(matches!(
            bot.setup_webhooks().await,
            Err(RuntimeError::MissingPublicUrl)
        ));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_with_listener_lifecycle() {
        let mut config = config();
        config.webhooks.remove_on_shutdown = true;
        let (bot, api) = bot_with(config, MockApi::new());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        bot.run_with_listener(listener, async {}).await.unwrap();

        let calls = api.calls();
        assert_eq!(
            calls.iter().filter(|c| c.starts_with("create_webhook")).count(),
            2
        );
        assert_eq!(
            calls.iter().filter(|c| c.starts_with("delete_webhook")).count(),
            2
        );
        assert!(api.webhooks().is_empty());
    }

    #[tokio::test]
    async fn test_partial_registration_is_cleaned_up() {
        let mut config = config();
        config.webhooks.remove_on_shutdown = true;
        let api = MockApi::new().rejecting_webhook(
            ATTACHMENT_ACTIONS_WEBHOOK_NAME,
            webex_bot_core::ApiError::Status {
                status: 400,
                message: "bad target".to_string(),
            },
        );
        let (bot, api) = bot_with(config, api);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let result = bot.run_with_listener(listener, async {}).await;

        assert!(matches!(result, Err(RuntimeError::Api(_))));
        assert!(api.webhooks().is_empty());
        assert_eq!(api.calls().last().map(String::as_str), Some("delete_webhook wh-1"));
    }

    #[tokio::test]
    async fn test_partial_registration_kept_without_removal() {
        let api = MockApi::new().rejecting_webhook(
            ATTACHMENT_ACTIONS_WEBHOOK_NAME,
            webex_bot_core::ApiError::Status {
                status: 400,
                message: "bad target".to_string(),
            },
        );
        let (bot, api) = bot_with(config(), api);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        assert!(bot.run_with_listener(listener, async {}).await.is_err());
        assert_eq!(api.webhooks().len(), 1);
    }

    #[tokio::test]
    async fn test_run_aborts_when_registration_fails() {
        let api = MockApi::new().failing_with(webex_bot_core::ApiError::Status {
            status: 401,
            message: "unauthorized".to_string(),
        });
        let (bot, _) = bot_with(config(), api);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let result = bot.run_with_listener(listener, async {}).await;
        assert!(matches!(result, Err(RuntimeError::Api(_))));
    }
}

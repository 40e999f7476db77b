//! Webhook dispatcher.
//!
//! The [`Dispatcher`] owns the ordered hook list and runs one dispatch pass
//! per inbound notification:
//!
//! 1. Hooks are classified in registration order
//! 2. Every hook that matches has its handler run, in the same order
//! 3. The first error aborts the pass and is returned to the caller
//!
//! ```rust,ignore
//! use webex_bot_core::{Dispatcher, Hook, Resource};
//!
//! let dispatcher = Dispatcher::new(api)
//!     .with(Hook::hears("hi|hello")?.handler(greet))
//!     .with(Hook::on(Resource::Memberships).handler(welcome));
//!
//! let fired = dispatcher.dispatch_value(body).await?;
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::{Instrument, Level, debug, span};

use crate::error::DispatchResult;
use crate::foundation::context::HookContext;
use crate::foundation::payload::WebhookPayload;
use crate::framework::hook::Hook;
use crate::integration::api::BoxedApi;

/// The central webhook dispatcher.
///
/// Hooks are registered during startup and read-only afterwards, so a
/// `Dispatcher` behind an `Arc` can serve concurrent passes without locking.
#[derive(Clone)]
pub struct Dispatcher {
    hooks: Vec<Hook>,
    api: BoxedApi,
    label: Arc<str>,
}

impl Dispatcher {
    /// Creates an empty dispatcher using `api` for lookups.
    pub fn new(api: BoxedApi) -> Self {
        Self {
            hooks: Vec::new(),
            api,
            label: Arc::from("bot"),
        }
    }

    /// Sets the label recorded on every dispatch span.
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Appends a hook. No duplicate detection is done.
    pub fn register(&mut self, hook: Hook) {
        debug!(bot = %self.label, hook = hook.name(), "Registered hook");
        self.hooks.push(hook);
    }

    /// Appends a hook (builder pattern).
    pub fn with(mut self, hook: Hook) -> Self {
        self.register(hook);
        self
    }

    /// Registered hooks, in evaluation order.
    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    /// Returns the number of registered hooks.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// The platform API handle.
    pub fn api(&self) -> &BoxedApi {
        &self.api
    }

    /// The label used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Runs one dispatch pass and returns how many handlers ran.
    pub async fn dispatch(&self, payload: WebhookPayload) -> DispatchResult<usize> {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            bot = %self.label,
            resource = %payload.resource(),
            event = %payload.event()
        );
        self.run(Arc::new(payload)).instrument(span).await
    }

    /// Parses a JSON body and dispatches it.
    pub async fn dispatch_value(&self, body: Value) -> DispatchResult<usize> {
        let payload = WebhookPayload::from_value(body)?;
        self.dispatch(payload).await
    }

    async fn run(&self, payload: Arc<WebhookPayload>) -> DispatchResult<usize> {
        let mut fired = 0;

        for hook in &self.hooks {
            let Some(matched) = hook.classify(self.api.as_ref(), &payload).await? else {
                continue;
            };

            debug!(hook = hook.name(), resolved = matched.resolved.kind(), "Running handler");
            let ctx = HookContext::new(
                hook.name_arc(),
                matched,
                Arc::clone(&payload),
                Arc::clone(&self.api),
            );
            hook.invoke(ctx).await?;
            fired += 1;
        }

        debug!(fired, "Dispatch finished");
        Ok(fired)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("label", &self.label)
            .field("hook_count", &self.hooks.len())
            .finish()
    }
}

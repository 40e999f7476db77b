//! # webex-bot transport
//!
//! Network implementations for the webex-bot framework.
//!
//! ## Features
//!
//! - `http-client` (default): [`RestClient`], the REST implementation of
//!   `MessagingApi`
//! - `http-server` (default): the axum webhook ingress feeding a `Dispatcher`
//! - `full`: both
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  webex-bot-runtime   │  (lifecycle, config)
//! ├──────────────────────┤
//! │  webex-bot-transport │  <- This crate
//! ├──────────────────────┤
//! │  webex-bot-core      │  (hooks, dispatcher, MessagingApi)
//! └──────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use webex_bot_transport::{RestClient, bind, router, serve};
//!
//! let api = Arc::new(RestClient::new(token)?);
//! let dispatcher = Arc::new(Dispatcher::new(api).with(hook));
//!
//! let listener = bind("0.0.0.0:8080").await?;
//! serve(listener, router("mybot", dispatcher), shutdown_signal()).await?;
//! ```

#[cfg(any(feature = "http-client", feature = "http-server"))]
pub mod http;

#[cfg(feature = "http-client")]
pub use http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, RestClient, RestClientBuilder};

#[cfg(feature = "http-server")]
pub use http::{attachment_actions_path, bind, events_path, router, serve};

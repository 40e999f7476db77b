//! HTTP transport.
//!
//! This module provides the REST client and the webhook ingress server.

#[cfg(feature = "http-client")]
mod client;
#[cfg(feature = "http-client")]
pub use client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, RestClient, RestClientBuilder};

#[cfg(feature = "http-server")]
pub mod server;
#[cfg(feature = "http-server")]
pub use server::{attachment_actions_path, bind, events_path, router, serve};

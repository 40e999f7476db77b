//! Integration layer - interfaces to external systems.

pub mod api;

pub use api::{BoxedApi, MessagingApi};

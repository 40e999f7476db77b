//! Framework layer - hooks, handlers and the dispatcher.

pub mod dispatcher;
pub mod extractor;
pub mod handler;
pub mod hook;

pub use dispatcher::Dispatcher;
pub use extractor::{Captures, Data, FromContext};
pub use handler::{BoxedHandler, Handler, HandlerResult, IntoHandlerResult, into_handler};
pub use hook::{Hook, HookBuilder, Pattern};

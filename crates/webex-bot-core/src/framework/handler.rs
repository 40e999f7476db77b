//! Handler system.
//!
//! Handlers are plain async functions whose parameters implement
//! [`FromContext`], in the style of axum:
//!
//! ```rust,ignore
//! use webex_bot_core::{BoxedApi, Captures, Message, NewMessage};
//!
//! async fn greet(message: Message, api: BoxedApi) -> Result<(), ApiError> {
//!     let room = message.room_id.clone().unwrap_or_default();
//!     api.create_message(&NewMessage::to_room(room).text("Hi!")).await?;
//!     Ok(())
//! }
//!
//! async fn echo(message: Message, groups: Captures) {
//!     println!("{} -> {:?}", message.text(), groups.first());
//! }
//! ```
//!
//! Whatever the function returns goes through [`IntoHandlerResult`]; an `Err`
//! aborts the dispatch pass and reaches the webhook ingress.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::debug;

use crate::error::BoxError;
use crate::foundation::context::HookContext;
use crate::foundation::model::Message;
use crate::framework::extractor::FromContext;

/// Result of running a handler.
pub type HandlerResult = Result<(), BoxError>;

// ============================================================================
// IntoHandlerResult - Handle handler return values
// ============================================================================

/// A trait for types that handlers may return.
pub trait IntoHandlerResult {
    /// Converts the return value into a handler result.
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

/// A sent reply; the framework has no use for it.
impl IntoHandlerResult for Message {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<T: IntoHandlerResult> IntoHandlerResult for Option<T> {
    fn into_handler_result(self) -> HandlerResult {
        match self {
            Some(t) => t.into_handler_result(),
            None => Ok(()),
        }
    }
}

impl<T, E> IntoHandlerResult for Result<T, E>
where
    T: IntoHandlerResult,
    E: Into<BoxError>,
{
    fn into_handler_result(self) -> HandlerResult {
        match self {
            Ok(t) => t.into_handler_result(),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// The core trait for hook callbacks.
///
/// Implemented for async functions taking 0-6 parameters that implement
/// [`FromContext`] and returning a type that implements [`IntoHandlerResult`].
#[async_trait]
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// Call the handler with the given context.
    async fn call(self, ctx: HookContext) -> HandlerResult;
}

/// A type-erased handler stored inside a [`Hook`](super::hook::Hook).
pub type BoxedHandler = Arc<dyn Fn(HookContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Convert a handler function into a boxed handler.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T>,
    T: 'static,
{
    Arc::new(move |ctx| f.clone().call(ctx))
}

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_variables)]
        #[async_trait]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: IntoHandlerResult + Send + 'static,
            $( $ty: FromContext + Send + 'static, )*
        {
            async fn call(self, ctx: HookContext) -> HandlerResult {
                $(
                    let $ty = match $ty::from_context(&ctx) {
                        Ok(value) => value,
                        Err(e) => {
                            debug!(
                                hook = ctx.hook_name(),
                                error = %e,
                                "Handler parameter not available, skipping handler"
                            );
                            return Ok(());
                        }
                    };
                )*

                (self)($($ty,)*).await.into_handler_result()
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);

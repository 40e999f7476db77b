//! Webhook ingress.
//!
//! Each bot exposes two routes, `/{bot}/events` and `/{bot}/attachmentActions`.
//! Both answer `GET` with `ok` so the public URL can be probed, and feed
//! `POST` bodies to the [`Dispatcher`].

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use webex_bot_core::{DispatchError, Dispatcher, TransportError, TransportResult};

/// Path of the route receiving all resource notifications.
pub fn events_path(bot_name: &str) -> String {
    format!("/{bot_name}/events")
}

/// Path of the route receiving card submissions.
pub fn attachment_actions_path(bot_name: &str) -> String {
    format!("/{bot_name}/attachmentActions")
}

/// Builds the ingress router for one bot.
pub fn router(bot_name: &str, dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route(&events_path(bot_name), get(probe).post(receive))
        .route(&attachment_actions_path(bot_name), get(probe).post(receive))
        .with_state(dispatcher)
}

/// Binds the listening socket.
pub async fn bind(addr: &str) -> TransportResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| TransportError::BindFailed {
            addr: addr.to_string(),
            reason: e.to_string(),
        })
}

/// Serves `router` until `shutdown` resolves.
///
/// In-flight requests are allowed to finish.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> TransportResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(addr = %addr, "Webhook server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| TransportError::Server(e.to_string()))?;

    info!("Webhook server stopped");
    Ok(())
}

async fn probe() -> &'static str {
    "ok"
}

async fn receive(State(dispatcher): State<Arc<Dispatcher>>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, len = body.len(), "Rejected webhook body");
            return (StatusCode::BAD_REQUEST, "invalid JSON").into_response();
        }
    };

    match dispatcher.dispatch_value(value).await {
        Ok(fired) => {
            debug!(fired, "Webhook handled");
            (StatusCode::OK, "ok").into_response()
        }
        Err(DispatchError::Payload(e)) => {
            warn!(error = %e, "Rejected webhook payload");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e) => {
            error!(error = %e, "Webhook dispatch failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "dispatch failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;
    use webex_bot_core::testing::MockApi;
    use webex_bot_core::{Hook, Message, Resource};

    fn request(method: Method, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn counting_router(counter: &Arc<AtomicUsize>) -> Router {
        let counter = Arc::clone(counter);
        let api = Arc::new(MockApi::new().with_message("m1", "p1", "hi bot"));
        let dispatcher = Dispatcher::new(api)
            .with(Hook::hears("hi").unwrap().handler(move |_message: Message| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }))
            .with(
                Hook::on(Resource::Rooms)
                    .handler(|| async { Err::<(), _>("room handler failed") }),
            );
        router("mybot", Arc::new(dispatcher))
    }

    #[tokio::test]
    async fn test_probe() {
        let app = counting_router(&Arc::new(AtomicUsize::new(0)));
        for path in ["/mybot/events", "/mybot/attachmentActions"] {
            let resp = app
                .clone()
                .oneshot(request(Method::GET, path, ""))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_post_dispatches() {
        let counter = Arc::new(AtomicUsize::new(0));
        let app = counting_router(&counter);
        let body = r#"{"resource":"messages","event":"created","data":{"id":"m1"}}"#;

        let resp = app
            .oneshot(request(Method::POST, "/mybot/events", body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let app = counting_router(&Arc::new(AtomicUsize::new(0)));

        let resp = app
            .clone()
            .oneshot(request(Method::POST, "/mybot/events", "{not json"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .oneshot(request(Method::POST, "/mybot/events", "[1,2,3]"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_handler_error_is_server_error() {
        let app = counting_router(&Arc::new(AtomicUsize::new(0)));
        let body = r#"{"resource":"rooms","event":"created","data":{"id":"r1"}}"#;

        let resp = app
            .oneshot(request(Method::POST, "/mybot/events", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unknown_bot_path() {
        let app = counting_router(&Arc::new(AtomicUsize::new(0)));
        let resp = app
            .oneshot(request(Method::POST, "/otherbot/events", "{}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_until_shutdown() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let app = counting_router(&Arc::new(AtomicUsize::new(0)));

        let server = tokio::spawn(serve(listener, app, async move {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();

        assert!(server.await.unwrap().is_ok());
    }
}

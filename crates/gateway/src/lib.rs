//! # Gateway
//!
//! HTTP surface of the server.
//!
//! - WebSocket endpoint at `http.ws_path`: one connection handler per viewer
//! - Static files from `http.static_dir` at `/` (the daily store lives there)
//!
//! ## Example
//!
//! ```ignore
//! let app = gateway::router(&blueprint.http, hub_handle);
//! gateway::serve(&blueprint.http, hub_handle, cancel).await?;
//! ```

mod connection;
mod error;

use std::net::SocketAddr;

use axum::{routing::get, Router};
use contracts::HttpConfig;
use dispatcher::HubHandle;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

pub use connection::{relay, ws_handler, RelayEnd};
pub use error::GatewayError;

/// Shared handler state
#[derive(Clone)]
pub struct GatewayState {
    /// Hub used to register viewers
    pub hub: HubHandle,
}

/// Build the application router
pub fn router(http: &HttpConfig, hub: HubHandle) -> Router {
    Router::new()
        .route(&http.ws_path, get(ws_handler))
        .with_state(GatewayState { hub })
        .fallback_service(ServeDir::new(&http.static_dir))
        .layer(TraceLayer::new_for_http())
}

/// Bind `http.bind` and serve until `cancel` fires
pub async fn serve(
    http: &HttpConfig,
    hub: HubHandle,
    cancel: CancellationToken,
) -> Result<(), GatewayError> {
    let addr: SocketAddr = http
        .bind
        .parse()
        .map_err(|e: std::net::AddrParseError| GatewayError::InvalidAddress {
            addr: http.bind.clone(),
            message: e.to_string(),
        })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| GatewayError::Bind {
            addr: http.bind.clone(),
            source,
        })?;

    serve_listener(listener, router(http, hub), cancel).await
}

/// Serve `app` on an already bound listener until `cancel` fires
pub async fn serve_listener(
    listener: TcpListener,
    app: Router,
    cancel: CancellationToken,
) -> Result<(), GatewayError> {
    if let Ok(addr) = listener.local_addr() {
        info!("HTTP server listening on http://{}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(GatewayError::Serve)?;

    info!("HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::extract::ws::Message;
    use axum::http::{Request, StatusCode};
    use contracts::{HubConfig, Item};
    use dispatcher::{DailyFileSink, Hub, StoreHandle};
    use futures_util::{SinkExt, StreamExt};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tower::ServiceExt;

    struct Fixture {
        dir: TempDir,
        http: HttpConfig,
        input: async_channel::Sender<Item>,
        hub: HubHandle,
        cancel: CancellationToken,
        _store: StoreHandle,
    }

    fn start() -> Fixture {
        let dir = tempdir().unwrap();
        let store = StoreHandle::spawn(
            DailyFileSink::open(dir.path().join("daily.json")).unwrap(),
            16,
        );
        let (input, rx) = async_channel::bounded(16);
        let hub_config = HubConfig {
            client_queue_capacity: 16,
            ..Default::default()
        };
        let (hub_task, hub) = Hub::new(&hub_config, rx, store.sender());
        let cancel = CancellationToken::new();
        hub_task.spawn(cancel.clone());

        let http = HttpConfig {
            bind: "127.0.0.1:0".into(),
            static_dir: dir.path().display().to_string(),
            ..Default::default()
        };

        Fixture {
            dir,
            http,
            input,
            hub,
            cancel,
            _store: store,
        }
    }

    async fn listen(fx: &Fixture) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(&fx.http, fx.hub.clone());
        tokio::spawn(serve_listener(listener, app, fx.cancel.clone()));
        addr
    }

    async fn wait_for_clients(hub: &HubHandle, count: usize) {
        timeout(Duration::from_secs(2), async {
            while hub.client_count() != count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("client count not reached");
    }

    #[tokio::test]
    async fn test_static_files_served() {
        let fx = start();
        std::fs::write(fx.dir.path().join("daily.json"), "E1\n").unwrap();

        let app = router(&fx.http, fx.hub.clone());
        let response = app
            .oneshot(Request::get("/daily.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"E1\n");
    }

    #[tokio::test]
    async fn test_missing_static_file() {
        let fx = start();
        let app = router(&fx.http, fx.hub.clone());
        let response = app
            .oneshot(Request::get("/nope.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_viewer_receives_items_as_text_frames() {
        let fx = start();
        let addr = listen(&fx).await;

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .unwrap();
        wait_for_clients(&fx.hub, 1).await;

        fx.input.send(Item::new(r#"{"ip":"1.2.3.4"}"#)).await.unwrap();
        fx.input.send(Item::new("E2")).await.unwrap();

        for expected in [r#"{"ip":"1.2.3.4"}"#, "E2"] {
            let frame = timeout(Duration::from_secs(2), ws.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            assert_eq!(frame, WsMessage::Text(expected.to_string()));
        }

        fx.cancel.cancel();
    }

    #[tokio::test]
    async fn test_viewer_close_unregisters() {
        let fx = start();
        let addr = listen(&fx).await;

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .unwrap();
        wait_for_clients(&fx.hub, 1).await;

        ws.close(None).await.unwrap();
        wait_for_clients(&fx.hub, 0).await;

        fx.cancel.cancel();
    }

    #[tokio::test]
    async fn test_shutdown_closes_viewers() {
        let fx = start();
        let addr = listen(&fx).await;

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .unwrap();
        wait_for_clients(&fx.hub, 1).await;

        fx.cancel.cancel();

        // Close frame (or end of stream) once the hub drops the client
        let next = timeout(Duration::from_secs(2), ws.next()).await.unwrap();
        assert!(matches!(next, None | Some(Ok(WsMessage::Close(_))) | Some(Err(_))));
    }

    /// Transport whose every write fails
    struct BrokenTransport;

    impl futures_util::Sink<Message> for BrokenTransport {
        type Error = String;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), String>> {
            Poll::Ready(Ok(()))
        }

        fn start_send(self: Pin<&mut Self>, _item: Message) -> Result<(), String> {
            Err("broken pipe".to_string())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), String>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), String>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_write_failure_unregisters_only_that_viewer() {
        let fx = start();
        let broken = fx.hub.register().await.unwrap();
        let mut healthy = fx.hub.register().await.unwrap();
        assert_eq!(fx.hub.client_count(), 2);

        let hub = fx.hub.clone();
        let relay_task = tokio::spawn(async move {
            let silent = futures_util::stream::pending::<Result<Message, String>>();
            relay(broken, &hub, BrokenTransport, silent).await
        });

        fx.input.send(Item::new("E1")).await.unwrap();
        let end = timeout(Duration::from_secs(2), relay_task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(end, RelayEnd::WriteFailed);
        wait_for_clients(&fx.hub, 1).await;

        fx.input.send(Item::new("E2")).await.unwrap();
        fx.input.send(Item::new("E3")).await.unwrap();

        for expected in ["E1", "E2", "E3"] {
            let item = timeout(Duration::from_secs(2), healthy.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(item.payload(), expected);
        }

        fx.cancel.cancel();
    }

    #[tokio::test]
    async fn test_serve_rejects_bad_address() {
        let fx = start();
        let http = HttpConfig {
            bind: "not-an-address".into(),
            ..Default::default()
        };
        let err = serve(&http, fx.hub.clone(), fx.cancel.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidAddress { .. }));
    }
}

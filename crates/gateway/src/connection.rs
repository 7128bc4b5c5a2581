//! Connection handler - one per live viewer
//!
//! Registration happens before the WebSocket upgrade so a viewer is only
//! accepted once it is in the hub registry. After the upgrade every item
//! the hub delivers is written as one text frame. Nothing the viewer sends
//! is interpreted, except a close frame.

use std::fmt::Display;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dispatcher::{HubHandle, Subscription};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::GatewayState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<GatewayState>) -> Response {
    let subscription = match state.hub.register().await {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!(error = %e, "client registration failed");
            return (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response();
        }
    };

    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, subscription, hub))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, subscription: Subscription, hub: HubHandle) {
    let (sender, receiver) = socket.split();
    relay(subscription, &hub, sender, receiver).await;
}

/// Why a relay ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    /// Writing a frame failed
    WriteFailed,
    /// Viewer closed or the stream ended
    ViewerClosed,
    /// Hub dropped the client (shutdown or disconnect-on-full)
    HubClosed,
}

/// Relay hub items to a viewer transport until either side goes away
///
/// Unregisters the client unless the hub itself dropped it.
pub async fn relay<S, R, E>(
    mut subscription: Subscription,
    hub: &HubHandle,
    mut sender: S,
    mut receiver: R,
) -> RelayEnd
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let client_id = subscription.id();
    debug!(client_id, "relay started");

    let end = loop {
        tokio::select! {
            item = subscription.recv() => match item {
                Some(item) => {
                    if let Err(e) = sender.send(Message::Text(item.payload().to_string())).await {
                        debug!(client_id, error = %e, "write failed");
                        break RelayEnd::WriteFailed;
                    }
                }
                None => {
                    let _ = sender.send(Message::Close(None)).await;
                    break RelayEnd::HubClosed;
                }
            },

            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break RelayEnd::ViewerClosed,
                Some(Err(e)) => {
                    debug!(client_id, error = %e, "read failed");
                    break RelayEnd::ViewerClosed;
                }
                // Viewers have nothing to say
                Some(Ok(_)) => {}
            },
        }
    };

    if end != RelayEnd::HubClosed {
        hub.unregister(client_id).await;
    }
    info!(client_id, end = ?end, "viewer disconnected");
    end
}

//! Live-Reload Channel
//!
//! The hub fans frames out to every connected live-reload client and keeps
//! one broadcast tap for in-process observers. `subscribe` is the single
//! listener registration point the error bridge uses; because only
//! connections that negotiated the live-reload sub-protocol join the hub,
//! the sub-protocol check lives where connections join, not on the
//! observer.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use plinth_types::{Frame, LIVE_RELOAD_PROTOCOL};

use super::state::AppState;

/// Fan-out point for live-reload frames
#[derive(Clone)]
pub struct LiveReloadHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    /// Connected live-reload clients
    clients: DashMap<Uuid, mpsc::Sender<String>>,

    /// Broadcast tap for in-process observers (the error bridge)
    tap: broadcast::Sender<String>,
}

impl LiveReloadHub {
    pub fn new() -> Self {
        let (tap, _) = broadcast::channel(256);

        Self {
            inner: Arc::new(HubInner {
                clients: DashMap::new(),
                tap,
            }),
        }
    }

    /// Subscribe to every frame that crosses the hub
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.inner.tap.subscribe()
    }

    /// Publish a frame to all clients and observers
    pub fn publish(&self, frame: &Frame) {
        match serde_json::to_string(frame) {
            Ok(text) => self.publish_raw(text),
            Err(e) => warn!("Failed to serialize live-reload frame: {}", e),
        }
    }

    /// Publish a raw text frame.
    ///
    /// The text is forwarded as-is; consumers decide what parses.
    pub fn publish_raw(&self, text: String) {
        let _ = self.inner.tap.send(text.clone());

        for client in self.inner.clients.iter() {
            if let Err(e) = client.value().try_send(text.clone()) {
                warn!("Failed to send frame to client {}: {}", client.key(), e);
            }
        }
    }

    /// Get the number of connected clients
    pub fn client_count(&self) -> usize {
        self.inner.clients.len()
    }

    fn register(&self, tx: mpsc::Sender<String>) -> Uuid {
        let session_id = Uuid::new_v4();
        self.inner.clients.insert(session_id, tx);
        info!("Live-reload client connected: {}", session_id);
        session_id
    }

    fn remove(&self, session_id: Uuid) {
        self.inner.clients.remove(&session_id);
        info!("Live-reload client disconnected: {}", session_id);
    }
}

impl Default for LiveReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// WebSocket upgrade handler for the live-reload endpoint
pub async fn hmr_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.protocols([LIVE_RELOAD_PROTOCOL])
        .on_upgrade(move |socket| handle_live_reload(socket, state))
}

/// Serve one live-reload connection.
///
/// Connections that did not negotiate the live-reload sub-protocol are
/// closed without joining the hub; whatever else they were for, their
/// traffic is not this channel's.
async fn handle_live_reload(mut socket: WebSocket, state: AppState) {
    let negotiated = socket
        .protocol()
        .and_then(|p| p.to_str().ok())
        .is_some_and(|p| p == LIVE_RELOAD_PROTOCOL);

    if !negotiated {
        debug!("Closing connection without live-reload sub-protocol");
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Channel for frames headed to this client
    let (tx, mut rx) = mpsc::channel::<String>(64);
    let session_id = state.hub().register(tx);

    if let Ok(connected) = serde_json::to_string(&Frame::Connected) {
        let _ = ws_sender.send(Message::Text(connected.into())).await;
    }

    // Forward hub frames to the socket
    let send_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Drain the socket until the client goes away
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Close(_) => break,
                Message::Ping(_) => {
                    // Pong is handled automatically by axum
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.hub().remove(session_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_receives_published_frames() {
        let hub = LiveReloadHub::new();
        let mut tap = hub.subscribe();

        hub.publish(&Frame::update(["src/app.rs".to_string()]));

        let text = tap.recv().await.unwrap();
        let frame: Frame = serde_json::from_str(&text).unwrap();
        assert_eq!(frame, Frame::update(["src/app.rs".to_string()]));
    }

    #[tokio::test]
    async fn test_publish_raw_forwards_text_verbatim() {
        let hub = LiveReloadHub::new();
        let mut tap = hub.subscribe();

        hub.publish_raw("not even json".to_string());

        assert_eq!(tap.recv().await.unwrap(), "not even json");
    }

    #[tokio::test]
    async fn test_clients_receive_published_frames() {
        let hub = LiveReloadHub::new();
        let (tx, mut rx) = mpsc::channel(8);
        let session_id = hub.register(tx);
        assert_eq!(hub.client_count(), 1);

        hub.publish(&Frame::FullReload);
        assert_eq!(rx.recv().await.unwrap(), "{\"type\":\"full-reload\"}");

        hub.remove(session_id);
        assert_eq!(hub.client_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_does_not_fail() {
        let hub = LiveReloadHub::new();
        hub.publish(&Frame::Connected);
    }
}

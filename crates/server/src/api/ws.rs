//! WebSocket transport: socket lifecycle, inbound frames and server pushes.
//!
//! Each socket gets a fresh connection id. Opening the socket is the
//! `$connect` event, closing it is `$disconnect`, and every text frame is
//! routed by its `action` field (`split` / `submit`).

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use stemsplit_core::{ConnectionRegistry, DeliveryError, Notification, Notifier, TransportEvent};

use crate::metrics::{
    WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_REJECTED, WS_CONNECTIONS_TOTAL, WS_FRAMES_RECEIVED,
};
use crate::state::AppState;

/// Capacity of each socket's outbound queue.
const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Route used for frames without a string `action`.
const DEFAULT_ROUTE: &str = "$default";

/// Live sockets by connection id, each with its outbound queue.
#[derive(Debug, Default)]
pub struct ConnectionHub {
    sockets: RwLock<HashMap<String, mpsc::Sender<String>>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a socket and returns the receiving end of its queue.
    pub async fn attach(&self, connection_id: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        self.sockets
            .write()
            .await
            .insert(connection_id.to_string(), tx);
        rx
    }

    /// Detaches a socket; queued frames are still flushed by its writer.
    pub async fn detach(&self, connection_id: &str) {
        self.sockets.write().await.remove(connection_id);
    }

    pub async fn len(&self) -> usize {
        self.sockets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sockets.read().await.is_empty()
    }

    /// Queues a text frame for a socket.
    pub async fn push(&self, connection_id: &str, text: String) -> Result<(), DeliveryError> {
        let sender = self
            .sockets
            .read()
            .await
            .get(connection_id)
            .cloned()
            .ok_or_else(|| DeliveryError::ConnectionGone(connection_id.to_string()))?;

        sender
            .send(text)
            .await
            .map_err(|_| DeliveryError::Transport {
                connection_id: connection_id.to_string(),
                reason: "socket writer closed".to_string(),
            })
    }
}

/// Pushes notifications to sockets attached to a [`ConnectionHub`].
///
/// Only registered connections are pushed to.
pub struct WsNotifier {
    registry: Arc<dyn ConnectionRegistry>,
    hub: Arc<ConnectionHub>,
}

impl WsNotifier {
    pub fn new(registry: Arc<dyn ConnectionRegistry>, hub: Arc<ConnectionHub>) -> Self {
        Self { registry, hub }
    }
}

#[async_trait]
impl Notifier for WsNotifier {
    async fn send(
        &self,
        connection_id: &str,
        notification: &Notification,
    ) -> Result<(), DeliveryError> {
        let registered = self
            .registry
            .is_registered(connection_id)
            .await
            .map_err(|e| DeliveryError::Transport {
                connection_id: connection_id.to_string(),
                reason: e.to_string(),
            })?;
        if !registered {
            return Err(DeliveryError::ConnectionGone(connection_id.to_string()));
        }

        let text = notification
            .to_json()
            .map_err(|e| DeliveryError::Encode(e.to_string()))?;
        self.hub.push(connection_id, text).await
    }
}

/// Builds the transport event for an inbound text frame.
pub fn frame_event(connection_id: &str, text: &str) -> TransportEvent {
    let route = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("action").and_then(|a| a.as_str()).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_ROUTE.to_string());

    TransportEvent::message(connection_id, route, text)
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4().to_string();
    let (mut sender, mut receiver) = socket.split();

    WS_CONNECTIONS_TOTAL.inc();

    let mut outbound = state.hub().attach(&connection_id).await;
    let connect = state
        .dispatcher()
        .dispatch(TransportEvent::connect(&connection_id))
        .await;
    if !connect.is_success() {
        WS_CONNECTIONS_REJECTED.inc();
        state.hub().detach(&connection_id).await;
        warn!(connection_id = %connection_id, "Closing socket, registration failed");
        let _ = sender
            .send(Message::Close(Some(CloseFrame {
                code: close_code::ERROR,
                reason: "registration failed".into(),
            })))
            .await;
        return;
    }

    WS_CONNECTIONS_ACTIVE.inc();
    info!(connection_id = %connection_id, "WebSocket client connected");

    // Writer: drains the outbound queue until the hub drops its sender
    let writer_id = connection_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if sender.send(Message::Text(text.into())).await.is_err() {
                debug!(connection_id = %writer_id, "WebSocket send failed, client disconnected");
                break;
            }
        }
        let _ = sender.close().await;
    });

    // Frames from one socket are handled one at a time, each job to completion
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let event = frame_event(&connection_id, text.as_str());
                let route = event.route_key.clone();
                let response = state.dispatcher().dispatch(event).await;
                let status = response.status.to_string();
                WS_FRAMES_RECEIVED
                    .with_label_values(&[route.as_str(), status.as_str()])
                    .inc();
                debug!(
                    connection_id = %connection_id,
                    route = %route,
                    status = response.status,
                    "Handled frame"
                );
            }
            Ok(Message::Close(_)) => {
                debug!(connection_id = %connection_id, "WebSocket client requested close");
                break;
            }
            Ok(_) => {
                // Ping/pong handled by axum; binary frames ignored
            }
            Err(e) => {
                warn!(connection_id = %connection_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    state
        .dispatcher()
        .dispatch(TransportEvent::disconnect(&connection_id))
        .await;
    state.hub().detach(&connection_id).await;
    let _ = send_task.await;

    WS_CONNECTIONS_ACTIVE.dec();
    info!(connection_id = %connection_id, "WebSocket client disconnected");
}

//! HTTP/WebSocket surface of one relay session.
//!
//! Three endpoints on the claimed port: `GET /health` for the cheap
//! liveness probe, `GET /discovery` for the one-shot identity exchange,
//! and `GET /rpc` for the long-lived frame connection.

use std::sync::Arc;

use axum::extract::ws::WebSocket;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tracing::{debug, info, warn};

use relay_rpc::RpcPeer;
use session_discovery::{ClaimedSession, SessionInfo};
use tabwire_core_types::{SessionStatus, TabId};

use crate::ws::WsTransport;

/// Shared state behind the endpoints of one session.
#[derive(Clone)]
pub struct RelayState {
    pub session_name: String,
    pub tab: TabId,
    pub peer: Arc<RpcPeer>,
}

impl RelayState {
    async fn session_info(&self) -> SessionInfo {
        if self.peer.is_connected().await {
            SessionInfo {
                name: self.session_name.clone(),
                status: SessionStatus::Connected,
                connected_tab: Some(self.tab.0.clone()),
            }
        } else {
            SessionInfo {
                name: self.session_name.clone(),
                status: SessionStatus::Ready,
                connected_tab: None,
            }
        }
    }
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/discovery", get(discovery))
        .route("/rpc", get(rpc))
        .with_state(state)
}

/// Serve the session on its claimed listener until the process exits.
pub async fn serve(claimed: ClaimedSession, state: RelayState) -> std::io::Result<()> {
    info!(
        target: "tabwire-relay",
        session = %claimed.name,
        port = claimed.port,
        "relay listening"
    );
    axum::serve(claimed.listener, router(state)).await
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn discovery(State(state): State<RelayState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| discovery_exchange(socket, state))
}

async fn discovery_exchange(mut socket: WebSocket, state: RelayState) {
    let info = state.session_info().await;
    match serde_json::to_string(&info) {
        Ok(payload) => {
            debug!(target: "tabwire-relay", session = %info.name, "discovery exchange");
            let _ = socket
                .send(axum::extract::ws::Message::Text(payload))
                .await;
        }
        Err(err) => warn!(target: "tabwire-relay", %err, "failed to encode session info"),
    }
    let _ = socket.close().await;
}

async fn rpc(State(state): State<RelayState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        info!(target: "tabwire-relay", session = %state.session_name, "rpc client connected");
        state.peer.attach(Arc::new(WsTransport::new(socket))).await;
    })
}

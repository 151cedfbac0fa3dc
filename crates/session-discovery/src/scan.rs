use std::time::Duration;

use futures::future::join_all;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};

use tabwire_core_types::SessionStatus;

use crate::ports::{port_for, session_names};

/// Payload of the discovery exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub name: String,
    pub status: SessionStatus,
    #[serde(rename = "connectedTab", default, skip_serializing_if = "Option::is_none")]
    pub connected_tab: Option<String>,
}

/// One live relay found by a scan. Ephemeral; rebuilt on every scan.
#[derive(Clone, Debug)]
pub struct DiscoveredSession {
    pub name: String,
    pub port: u16,
    pub status: SessionStatus,
    pub connected_tab: Option<String>,
}

/// Scan every known session port in parallel.
///
/// Overall latency is bounded by the slowest surviving probe, not the sum;
/// each port gets its own `budget`.
pub async fn discover(budget: Duration) -> Vec<DiscoveredSession> {
    let probes = session_names()
        .iter()
        .map(|name| probe_port(port_for(name), budget));
    join_all(probes).await.into_iter().flatten().collect()
}

/// Two-phase probe of one port.
///
/// Phase 1 is a cheap `GET /health` with half the budget, the only part
/// allowed to fail, and it fails silently, so scanning closed ports makes
/// no noise. Phase 2, attempted only against a live port, upgrades to the
/// discovery exchange with the remaining half.
pub async fn probe_port(port: u16, budget: Duration) -> Option<DiscoveredSession> {
    let half = budget / 2;

    let health_url = format!("http://127.0.0.1:{port}/health");
    let alive = matches!(
        timeout(half, reqwest::Client::new().get(&health_url).send()).await,
        Ok(Ok(resp)) if resp.status().is_success()
    );
    if !alive {
        trace!(target: "session-discovery", port, "port not alive");
        return None;
    }

    let ws_url = format!("ws://127.0.0.1:{port}/discovery");
    let info = timeout(half, exchange(&ws_url)).await.ok().flatten();
    match info {
        Some(info) => {
            debug!(target: "session-discovery", port, name = %info.name, "discovered session");
            Some(DiscoveredSession {
                name: info.name,
                port,
                status: info.status,
                connected_tab: info.connected_tab,
            })
        }
        None => {
            debug!(target: "session-discovery", port, "alive port failed discovery exchange");
            None
        }
    }
}

async fn exchange(ws_url: &str) -> Option<SessionInfo> {
    let (mut stream, _) = connect_async(ws_url).await.ok()?;
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => return serde_json::from_str(&text).ok(),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
    None
}

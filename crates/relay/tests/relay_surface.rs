//! End-to-end surface tests: a claimed session served over real sockets,
//! probed and driven by a plain tungstenite client.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use relay_rpc::{RpcConfig, RpcPeer};
use session_discovery::{claim_session, discover, probe_port, session_names, SessionInfo};
use tabwire_core_types::{SessionStatus, TabId};
use tabwire_relay::{serve, PageHost, RelayState, ToolRouter};

const PAGE: &str = r#"
    <main>
        <h1>Orders</h1>
        <button data-testid="refresh">Refresh</button>
        <input aria-label="Search orders">
    </main>
"#;

async fn start_relay() -> (String, u16) {
    let claimed = claim_session().await.expect("no free session name");
    let name = claimed.name.clone();
    let port = claimed.port;

    let page = PageHost::spawn(PAGE.to_string());
    let router = ToolRouter::new(page);
    let peer = Arc::new(RpcPeer::with_handler(
        RpcConfig::default(),
        Arc::new(router),
    ));
    let state = RelayState {
        session_name: name.clone(),
        tab: TabId::new(),
        peer,
    };
    tokio::spawn(async move {
        let _ = serve(claimed, state).await;
    });
    // Give axum a beat to start accepting.
    tokio::time::sleep(Duration::from_millis(50)).await;
    (name, port)
}

#[tokio::test]
async fn probe_discovers_a_served_session_as_ready() {
    let (name, port) = start_relay().await;

    let found = probe_port(port, Duration::from_secs(2))
        .await
        .expect("probe found nothing");
    assert_eq!(found.name, name);
    assert_eq!(found.status, SessionStatus::Ready);
    assert!(found.connected_tab.is_none());
}

#[tokio::test]
async fn full_scan_finds_a_claimed_session_among_closed_ports() {
    let (name, _port) = start_relay().await;

    // Every known port is probed; the ones nobody claimed must stay
    // silent, and the served session must come back as ready.
    let sessions = discover(Duration::from_secs(2)).await;
    let ours = sessions
        .iter()
        .find(|s| s.name == name)
        .expect("claimed session missing from scan");
    assert_eq!(ours.status, SessionStatus::Ready);
    assert!(ours.connected_tab.is_none());

    for session in &sessions {
        assert!(
            session_names().contains(&session.name.as_str()),
            "scan invented a session {:?}",
            session.name
        );
    }
}

#[tokio::test]
async fn discovery_reports_connected_once_an_rpc_client_attaches() {
    let (_name, port) = start_relay().await;

    let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/rpc"))
        .await
        .expect("rpc connect");
    // The attach happens inside the upgrade task; nudge the scheduler.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let found = probe_port(port, Duration::from_secs(2))
        .await
        .expect("probe found nothing");
    assert_eq!(found.status, SessionStatus::Connected);
    assert!(found.connected_tab.is_some());

    let _ = ws.close(None).await;
}

#[tokio::test]
async fn discovery_endpoint_sends_one_session_info_then_closes() {
    let (name, port) = start_relay().await;

    let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/discovery"))
        .await
        .expect("discovery connect");
    let frame = ws.next().await.expect("no frame").expect("ws error");
    let info: SessionInfo = serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(info.name, name);
    assert_eq!(info.status, SessionStatus::Ready);

    // Server closes after the exchange.
    loop {
        match ws.next().await {
            None | Some(Ok(Message::Close(_))) => break,
            Some(Ok(_)) => continue,
            Some(Err(_)) => break,
        }
    }
}

type WsClient = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn call(ws: &mut WsClient, id: u64, call_type: &str, payload: Value) -> Value {
    let frame = json!({
        "kind": "call",
        "id": id,
        "type": call_type,
        "payload": payload,
    });
    ws.send(Message::Text(frame.to_string())).await.unwrap();
    loop {
        let msg = ws.next().await.expect("stream ended").expect("ws error");
        let Ok(text) = msg.to_text() else { continue };
        let value: Value = serde_json::from_str(text).unwrap();
        if value["kind"] == "result" && value["id"] == id {
            return value;
        }
    }
}

#[tokio::test]
async fn snapshot_ref_survives_a_click_round_trip() {
    let (_name, port) = start_relay().await;

    let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/rpc"))
        .await
        .expect("rpc connect");

    let result = call(&mut ws, 1, "snapshot", json!({})).await;
    let text = result["result"]["snapshot"].as_str().unwrap();
    assert!(text.contains("- button \"Refresh\""), "got:\n{text}");

    let button_line = text
        .lines()
        .find(|line| line.contains("\"Refresh\""))
        .unwrap();
    let start = button_line.find("[s").unwrap() + 1;
    let end = button_line[start..].find('|').unwrap() + start;
    let button_ref = &button_line[start..end];

    let clicked = call(&mut ws, 2, "click", json!({"ref": button_ref})).await;
    assert_eq!(clicked["result"]["success"], true);
    assert_eq!(clicked["result"]["role"], "button");
    assert_eq!(clicked["result"]["name"], "Refresh");

    // A new snapshot retires the old reference; the stale token must be
    // refused, not re-resolved.
    let _ = call(&mut ws, 3, "snapshot", json!({})).await;
    let stale = call(&mut ws, 4, "click", json!({"ref": button_ref})).await;
    let error = stale["error"].as_str().unwrap();
    assert!(error.contains("stale"), "got: {error}");

    let _ = ws.close(None).await;
}

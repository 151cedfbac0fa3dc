//! WebSocket-backed frame transport.
//!
//! Adapts an accepted axum WebSocket to the `WireTransport` pipe: frames
//! are JSON text messages, close frames and decode failures both end the
//! inbound stream.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use relay_rpc::{RpcError, WireFrame, WireTransport};

pub struct WsTransport {
    sink: Mutex<SplitSink<WebSocket, Message>>,
    stream: Mutex<SplitStream<WebSocket>>,
}

impl WsTransport {
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }
}

#[async_trait]
impl WireTransport for WsTransport {
    async fn send(&self, frame: WireFrame) -> Result<(), RpcError> {
        let text = frame
            .encode()
            .map_err(|err| RpcError::Transport(err.to_string()))?;
        self.sink
            .lock()
            .await
            .send(Message::Text(text))
            .await
            .map_err(|err| RpcError::Transport(err.to_string()))
    }

    async fn next(&self) -> Option<WireFrame> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await? {
                Ok(Message::Text(text)) => match WireFrame::decode(&text) {
                    Ok(frame) => return Some(frame),
                    Err(err) => {
                        warn!(target: "tabwire-relay", error = %err, "undecodable frame, dropping connection");
                        return None;
                    }
                },
                Ok(Message::Close(_)) => {
                    debug!(target: "tabwire-relay", "peer sent close");
                    return None;
                }
                // Axum answers pings itself; binary frames are not part of
                // the protocol.
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
                Ok(Message::Binary(_)) => {
                    warn!(target: "tabwire-relay", "unexpected binary frame, dropping connection");
                    return None;
                }
                Err(err) => {
                    debug!(target: "tabwire-relay", error = %err, "websocket read error");
                    return None;
                }
            }
        }
    }

    async fn close(&self) {
        let mut sink = self.sink.lock().await;
        let _ = sink.send(Message::Close(None)).await;
        let _ = sink.close().await;
    }
}

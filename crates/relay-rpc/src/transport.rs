use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::errors::RpcError;
use crate::wire::WireFrame;

/// A bidirectional frame pipe. Implementations: WebSocket in the relay
/// binary, an in-memory duplex pair in tests.
#[async_trait]
pub trait WireTransport: Send + Sync {
    async fn send(&self, frame: WireFrame) -> Result<(), RpcError>;

    /// Next inbound frame; `None` once the transport is closed.
    async fn next(&self) -> Option<WireFrame>;

    async fn close(&self);
}

/// In-memory transport for tests: two halves joined by channels.
pub struct DuplexTransport {
    tx: mpsc::Sender<WireFrame>,
    rx: Mutex<mpsc::Receiver<WireFrame>>,
}

impl DuplexTransport {
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::channel(64);
        let (b_tx, b_rx) = mpsc::channel(64);
        (
            Self {
                tx: a_tx,
                rx: Mutex::new(b_rx),
            },
            Self {
                tx: b_tx,
                rx: Mutex::new(a_rx),
            },
        )
    }
}

#[async_trait]
impl WireTransport for DuplexTransport {
    async fn send(&self, frame: WireFrame) -> Result<(), RpcError> {
        self.tx
            .send(frame)
            .await
            .map_err(|err| RpcError::Transport(err.to_string()))
    }

    async fn next(&self) -> Option<WireFrame> {
        self.rx.lock().await.recv().await
    }

    async fn close(&self) {
        self.rx.lock().await.close();
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, warn};

use tabwire_core_types::{CallEnvelope, ResultEnvelope};

use crate::errors::RpcError;
use crate::pending::PendingCalls;
use crate::transport::WireTransport;
use crate::wire::WireFrame;

/// Handles calls arriving from the remote side of the connection.
#[async_trait]
pub trait CallHandler: Send + Sync {
    async fn handle(&self, call_type: String, payload: Value) -> Result<Value, String>;
}

#[derive(Clone, Debug)]
pub struct RpcConfig {
    /// Per-call deadline when the caller does not override it.
    pub default_deadline: Duration,
    /// Ping cadence for the accepting side; `None` disables the heartbeat.
    pub heartbeat_interval: Option<Duration>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            default_deadline: Duration::from_secs(30),
            heartbeat_interval: None,
        }
    }
}

struct Connection {
    outbound: mpsc::Sender<WireFrame>,
    alive: Arc<AtomicBool>,
    transport: Arc<dyn WireTransport>,
    loop_task: JoinHandle<()>,
    heartbeat_task: Option<JoinHandle<()>>,
}

impl Connection {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    async fn shut_down(&self) {
        self.alive.store(false, Ordering::Relaxed);
        self.transport.close().await;
        self.loop_task.abort();
        if let Some(task) = &self.heartbeat_task {
            task.abort();
        }
    }
}

/// One endpoint of the tool RPC link.
///
/// At most one connection is authoritative at a time; attaching a new
/// transport supersedes and closes the previous one. In-flight calls are
/// not failed on detach; they settle on their own deadlines (the pending
/// table does not care which connection carried the request out).
pub struct RpcPeer {
    config: RpcConfig,
    pending: Arc<PendingCalls>,
    handler: Option<Arc<dyn CallHandler>>,
    conn: Mutex<Option<Connection>>,
}

impl RpcPeer {
    pub fn new(config: RpcConfig) -> Self {
        Self {
            config,
            pending: Arc::new(PendingCalls::new()),
            handler: None,
            conn: Mutex::new(None),
        }
    }

    pub fn with_handler(config: RpcConfig, handler: Arc<dyn CallHandler>) -> Self {
        Self {
            config,
            pending: Arc::new(PendingCalls::new()),
            handler: Some(handler),
            conn: Mutex::new(None),
        }
    }

    /// Make `transport` the authoritative connection, superseding any prior.
    pub async fn attach(&self, transport: Arc<dyn WireTransport>) {
        let (outbound_tx, outbound_rx) = mpsc::channel(64);
        let alive = Arc::new(AtomicBool::new(true));
        let pong_seen = Arc::new(AtomicBool::new(true));

        let loop_task = tokio::spawn(run_loop(
            transport.clone(),
            outbound_rx,
            outbound_tx.clone(),
            self.pending.clone(),
            self.handler.clone(),
            alive.clone(),
            pong_seen.clone(),
        ));

        let heartbeat_task = self.config.heartbeat_interval.map(|every| {
            tokio::spawn(heartbeat(
                transport.clone(),
                outbound_tx.clone(),
                alive.clone(),
                pong_seen,
                every,
            ))
        });

        let fresh = Connection {
            outbound: outbound_tx,
            alive,
            transport,
            loop_task,
            heartbeat_task,
        };

        let previous = { self.conn.lock().await.replace(fresh) };
        if let Some(old) = previous {
            debug!(target: "relay-rpc", "superseding previous connection");
            old.shut_down().await;
        }
    }

    /// Drop the current connection, if any.
    pub async fn detach(&self) {
        if let Some(old) = self.conn.lock().await.take() {
            old.shut_down().await;
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.conn
            .lock()
            .await
            .as_ref()
            .map(Connection::is_alive)
            .unwrap_or(false)
    }

    /// Issue one call with the default deadline.
    pub async fn call(&self, call_type: &str, payload: Value) -> Result<Value, RpcError> {
        self.call_with_deadline(call_type, payload, self.config.default_deadline)
            .await
    }

    pub async fn call_with_deadline(
        &self,
        call_type: &str,
        payload: Value,
        deadline: Duration,
    ) -> Result<Value, RpcError> {
        let outbound = {
            let guard = self.conn.lock().await;
            match guard.as_ref() {
                Some(conn) if conn.is_alive() => conn.outbound.clone(),
                _ => return Err(RpcError::NoConnection),
            }
        };

        let (id, mut rx) = self.pending.register();
        let frame = WireFrame::Call(CallEnvelope {
            id,
            call_type: call_type.to_string(),
            payload,
        });

        if outbound.send(frame).await.is_err() {
            self.pending.abandon(id);
            return Err(RpcError::NoConnection);
        }

        match timeout(deadline, &mut rx).await {
            Ok(Ok(env)) => settle_result(env),
            Ok(Err(_)) => Err(RpcError::Transport(
                "response channel closed".to_string(),
            )),
            Err(_) => {
                if self.pending.abandon(id) {
                    Err(RpcError::Timeout(deadline))
                } else {
                    // The response won the race against the deadline and is
                    // already sitting in the channel; honor it.
                    match rx.try_recv() {
                        Ok(env) => settle_result(env),
                        Err(_) => Err(RpcError::Timeout(deadline)),
                    }
                }
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.pending.in_flight()
    }
}

fn settle_result(env: ResultEnvelope) -> Result<Value, RpcError> {
    if env.success {
        Ok(env.result.unwrap_or(Value::Null))
    } else {
        Err(RpcError::Remote(
            env.error.unwrap_or_else(|| "unknown remote failure".to_string()),
        ))
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_loop(
    transport: Arc<dyn WireTransport>,
    mut outbound_rx: mpsc::Receiver<WireFrame>,
    outbound_tx: mpsc::Sender<WireFrame>,
    pending: Arc<PendingCalls>,
    handler: Option<Arc<dyn CallHandler>>,
    alive: Arc<AtomicBool>,
    pong_seen: Arc<AtomicBool>,
) {
    loop {
        tokio::select! {
            maybe_out = outbound_rx.recv() => {
                match maybe_out {
                    Some(frame) => {
                        if let Err(err) = transport.send(frame).await {
                            warn!(target: "relay-rpc", %err, "transport send failed");
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = transport.next() => {
                match incoming {
                    Some(WireFrame::Result(env)) => {
                        if !pending.settle(env) {
                            debug!(target: "relay-rpc", "response for settled or unknown call");
                        }
                    }
                    Some(WireFrame::Call(call)) => {
                        dispatch(call, handler.clone(), outbound_tx.clone());
                    }
                    Some(WireFrame::Ping) => {
                        if outbound_tx.send(WireFrame::Pong).await.is_err() {
                            break;
                        }
                    }
                    Some(WireFrame::Pong) => {
                        pong_seen.store(true, Ordering::Relaxed);
                    }
                    None => break,
                }
            }
        }
    }
    // In-flight calls are left to their deadlines on purpose.
    alive.store(false, Ordering::Relaxed);
    debug!(target: "relay-rpc", "connection loop ended");
}

fn dispatch(
    call: CallEnvelope,
    handler: Option<Arc<dyn CallHandler>>,
    outbound: mpsc::Sender<WireFrame>,
) {
    tokio::spawn(async move {
        let env = match handler {
            Some(handler) => match handler.handle(call.call_type, call.payload).await {
                Ok(result) => ResultEnvelope::ok(call.id, result),
                Err(message) => ResultEnvelope::err(call.id, message),
            },
            None => ResultEnvelope::err(call.id, "no handler registered"),
        };
        let _ = outbound.send(WireFrame::Result(env)).await;
    });
}

/// Liveness keeper for the accepting side: a pong must land between two
/// consecutive pings or the connection is reclaimed.
async fn heartbeat(
    transport: Arc<dyn WireTransport>,
    outbound: mpsc::Sender<WireFrame>,
    alive: Arc<AtomicBool>,
    pong_seen: Arc<AtomicBool>,
    every: Duration,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while alive.load(Ordering::Relaxed) {
        ticker.tick().await;
        if !alive.load(Ordering::Relaxed) {
            break;
        }
        if !pong_seen.swap(false, Ordering::Relaxed) {
            warn!(target: "relay-rpc", "pong missed, reclaiming half-dead connection");
            alive.store(false, Ordering::Relaxed);
            transport.close().await;
            break;
        }
        if outbound.send(WireFrame::Ping).await.is_err() {
            break;
        }
    }
}

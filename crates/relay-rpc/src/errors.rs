use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RpcError {
    /// No transport is attached; detected synchronously, never waits.
    #[error("no connection")]
    NoConnection,

    /// Deadline expired before the matching response arrived.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// The remote handler ran and reported failure.
    #[error("{0}")]
    Remote(String),

    /// The transport dropped the response channel mid-call.
    #[error("transport error: {0}")]
    Transport(String),
}

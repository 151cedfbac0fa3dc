//! Remote tool RPC layer.
//!
//! One persistent bidirectional connection carries `{id, type, payload}`
//! calls and `{id, success, result|error}` results. Outgoing calls are
//! correlated by id in a pending table with a bounded deadline; exactly one
//! of {response, timeout} settles each call. A connectionless call fails
//! immediately instead of waiting out a timeout, and the accepting side
//! keeps the link honest with ping/pong heartbeats.

pub mod errors;
pub mod peer;
pub mod pending;
pub mod transport;
pub mod wire;

pub use errors::RpcError;
pub use peer::{CallHandler, RpcConfig, RpcPeer};
pub use pending::PendingCalls;
pub use transport::{DuplexTransport, WireTransport};
pub use wire::WireFrame;

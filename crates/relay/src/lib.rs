//! Relay surface: the piece that lives next to the page.
//!
//! A `PageHost` owns the live document and the reference registry on a
//! dedicated thread; tool handlers resolve references, act through the
//! input port, and return structured results; the axum server exposes the
//! health probe, the discovery exchange and the RPC WebSocket.

pub mod errors;
pub mod handlers;
pub mod input;
pub mod page;
pub mod server;
pub mod ws;

pub use errors::RelayError;
pub use handlers::ToolRouter;
pub use page::{ActionReply, PageHost, SnapshotReply, Target};
pub use server::{router, serve, RelayState};

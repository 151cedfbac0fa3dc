//! Session discovery protocol.
//!
//! A small fixed list of human-readable session names maps deterministically
//! to ports; a starting relay claims the first free one, and a client hunts
//! for live relays by scanning all candidate ports in parallel. Scanning is
//! intentionally quiet: a cheap health probe gates the more expensive
//! discovery exchange, so closed ports never surface transport errors.

pub mod claim;
pub mod errors;
pub mod ports;
pub mod scan;

pub use claim::{claim_session, ClaimedSession};
pub use errors::DiscoveryError;
pub use ports::{port_for, session_names};
pub use scan::{discover, probe_port, DiscoveredSession, SessionInfo};

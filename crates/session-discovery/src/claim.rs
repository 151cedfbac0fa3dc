use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::errors::DiscoveryError;
use crate::ports::{port_for, session_names};

/// A successfully claimed session: the name, its port, and the bound
/// listener the relay serves on.
pub struct ClaimedSession {
    pub name: String,
    pub port: u16,
    pub listener: TcpListener,
}

/// Claim the first free session name, in fixed order.
///
/// A failed bind means another relay owns that name; move on.
pub async fn claim_session() -> Result<ClaimedSession, DiscoveryError> {
    for name in session_names() {
        let port = port_for(name);
        match TcpListener::bind(("127.0.0.1", port)).await {
            Ok(listener) => {
                info!(target: "session-discovery", name, port, "claimed session");
                return Ok(ClaimedSession {
                    name: name.to_string(),
                    port,
                    listener,
                });
            }
            Err(err) => {
                debug!(target: "session-discovery", name, port, %err, "name in use, trying next");
            }
        }
    }
    Err(DiscoveryError::AllSessionsTaken)
}

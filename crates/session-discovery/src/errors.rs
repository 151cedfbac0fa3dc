use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Every session name's port is already bound by another relay.
    #[error("all session names are taken")]
    AllSessionsTaken,
}

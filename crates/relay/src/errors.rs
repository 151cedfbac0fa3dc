use aria_snapshot::SnapshotError;
use thiserror::Error;

/// Handler-boundary failures. All of these are recovered at the handler and
/// returned to the caller as `{success: false, error}`; none cross the RPC
/// layer as a panic or transport fault.
#[derive(Debug, Error, Clone)]
pub enum RelayError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// The element resolved fine but is the wrong kind for the action.
    #[error("cannot {action}: target <{found}> is not {expected}")]
    WrongElementKind {
        action: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("missing or invalid argument: {0}")]
    BadArgs(String),

    /// The page worker thread is gone; nothing can be resolved anymore.
    #[error("page context unavailable")]
    PageGone,
}

use thiserror::Error;

/// Snapshot and reference-resolution failures.
///
/// Callers need to tell a retired reference apart from a missing element
/// and from a selector that never parsed, to decide whether a retry with a
/// fresh snapshot makes sense.
#[derive(Debug, Error, Clone)]
pub enum SnapshotError {
    /// Token was issued by an earlier generation; fail-closed, never guessed.
    #[error("stale reference {token}: a newer snapshot has been taken")]
    StaleRef { token: String },

    /// Token did not match the `s<generation>e<index>` shape.
    #[error("malformed reference token: {0}")]
    MalformedRef(String),

    /// Token generation is current but nothing is behind it, or a selector
    /// matched no element.
    #[error("element not found: {0}")]
    NotFound(String),

    /// Caller-supplied selector failed to parse.
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

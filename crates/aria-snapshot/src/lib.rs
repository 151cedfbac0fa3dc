//! Accessibility snapshot & remote reference protocol.
//!
//! Converts a live document into a compact role/name tree for a language
//! model, minting opaque `s<generation>e<index>` reference tokens for every
//! visited element. Tokens are valid only for the generation they were
//! issued in; taking a new snapshot invalidates all prior tokens wholesale,
//! so a reference can never silently resolve to the wrong element after the
//! page changed.

pub mod builder;
pub mod errors;
pub mod model;
pub mod name;
pub mod registry;
pub mod render;
pub mod resolve;
pub mod roles;

pub use builder::build_snapshot;
pub use errors::SnapshotError;
pub use model::{AriaChild, AriaNode, AriaSnapshot, RefToken, StateFlags};
pub use registry::RefRegistry;
pub use render::render_snapshot;
pub use resolve::resolve_target;

//! Shortest-unique selector synthesis.
//!
//! Given a live element, produce the shortest CSS selector that matches
//! exactly that element in the whole document at the time of computation.
//! Synthesized selectors are a human-debuggable companion to opaque
//! reference tokens; they are *not* guaranteed stable across DOM mutations.

pub mod stability;

mod synth;

pub use synth::{synthesize, SynthesizedSelector};

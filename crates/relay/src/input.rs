//! Input effects, behind a seam.
//!
//! Realistic click/type dispatch goes through debugger-protocol helpers
//! that are external to this crate; `InputPort` is the interface they plug
//! into. `DomInput` is the in-process implementation: it records the
//! model-level effect so handlers and tests can observe what happened.

use std::collections::HashMap;

use ego_tree::NodeId;

pub trait InputPort: Send {
    fn click(&mut self, node: NodeId);
    fn type_text(&mut self, node: NodeId, text: &str);
    fn select(&mut self, node: NodeId, values: &[String]);

    fn value_of(&self, node: NodeId) -> Option<&str>;
    fn selection_of(&self, node: NodeId) -> Option<&[String]>;
    fn click_count(&self, node: NodeId) -> usize;
}

#[derive(Default)]
pub struct DomInput {
    values: HashMap<NodeId, String>,
    selections: HashMap<NodeId, Vec<String>>,
    clicks: HashMap<NodeId, usize>,
}

impl DomInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; called when the document is replaced.
    pub fn reset(&mut self) {
        self.values.clear();
        self.selections.clear();
        self.clicks.clear();
    }
}

impl InputPort for DomInput {
    fn click(&mut self, node: NodeId) {
        *self.clicks.entry(node).or_insert(0) += 1;
    }

    fn type_text(&mut self, node: NodeId, text: &str) {
        self.values.insert(node, text.to_string());
    }

    fn select(&mut self, node: NodeId, values: &[String]) {
        self.selections.insert(node, values.to_vec());
    }

    fn value_of(&self, node: NodeId) -> Option<&str> {
        self.values.get(&node).map(String::as_str)
    }

    fn selection_of(&self, node: NodeId) -> Option<&[String]> {
        self.selections.get(&node).map(Vec::as_slice)
    }

    fn click_count(&self, node: NodeId) -> usize {
        self.clicks.get(&node).copied().unwrap_or(0)
    }
}

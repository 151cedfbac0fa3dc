//! Generation-scoped reference registry.
//!
//! One registry per page context. A plain incrementing generation plus
//! wholesale map replacement stands in for per-element liveness tracking:
//! starting a new snapshot retires every previously issued token at once.

use std::collections::HashMap;

use ego_tree::NodeId;
use tracing::debug;

use crate::model::RefToken;

#[derive(Debug, Default)]
pub struct RefRegistry {
    generation: u32,
    next_index: u32,
    elements: HashMap<u32, NodeId>,
}

impl RefRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new snapshot generation, discarding the previous element map.
    pub fn begin_generation(&mut self) -> u32 {
        self.generation += 1;
        self.next_index = 0;
        self.elements.clear();
        debug!(target: "aria-snapshot", generation = self.generation, "new snapshot generation");
        self.generation
    }

    /// Issue the next reference token for `node`, in traversal order.
    pub fn assign(&mut self, node: NodeId) -> RefToken {
        self.next_index += 1;
        self.elements.insert(self.next_index, node);
        RefToken {
            generation: self.generation,
            index: self.next_index,
        }
    }

    /// Resolve a token to its element handle. Tokens from any generation
    /// other than the current one are dead, full stop.
    pub fn resolve(&self, token: &RefToken) -> Option<NodeId> {
        if token.generation != self.generation {
            return None;
        }
        self.elements.get(&token.index).copied()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn some_node(doc: &Html) -> NodeId {
        doc.tree.root().id()
    }

    #[test]
    fn tokens_are_dense_from_one() {
        let doc = Html::parse_document("<p>x</p>");
        let mut registry = RefRegistry::new();
        registry.begin_generation();
        let a = registry.assign(some_node(&doc));
        let b = registry.assign(some_node(&doc));
        assert_eq!((a.generation, a.index), (1, 1));
        assert_eq!((b.generation, b.index), (1, 2));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn new_generation_retires_all_prior_tokens() {
        let doc = Html::parse_document("<p>x</p>");
        let mut registry = RefRegistry::new();
        registry.begin_generation();
        let token = registry.assign(some_node(&doc));
        assert!(registry.resolve(&token).is_some());

        registry.begin_generation();
        // Same tree position still exists, but the token is from a retired
        // generation and must not resolve.
        assert!(registry.resolve(&token).is_none());

        let fresh = registry.assign(some_node(&doc));
        assert_eq!(fresh.generation, 2);
        assert!(registry.resolve(&fresh).is_some());
    }

    #[test]
    fn unknown_index_does_not_resolve() {
        let mut registry = RefRegistry::new();
        registry.begin_generation();
        let missing = RefToken {
            generation: 1,
            index: 42,
        };
        assert!(registry.resolve(&missing).is_none());
    }
}

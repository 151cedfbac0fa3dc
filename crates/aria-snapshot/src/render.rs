//! Text rendering of a snapshot for the tool-call response.
//!
//! Each line carries the node's reference token next to a freshly
//! synthesized selector: `[<ref>|<selector>]`. The selector is recomputed
//! per render against the live element, so two renders of the same token
//! may print different selectors after a DOM change; the token's validity
//! is still generation-gated either way.

use scraper::{ElementRef, Html};
use std::fmt::Write;

use selector_synth::synthesize;

use crate::model::{AriaChild, AriaNode, AriaSnapshot};
use crate::registry::RefRegistry;

pub fn render_snapshot(doc: &Html, registry: &RefRegistry, snapshot: &AriaSnapshot) -> String {
    let mut out = String::new();
    render_children(doc, registry, &snapshot.nodes, 0, &mut out);
    out
}

fn render_children(
    doc: &Html,
    registry: &RefRegistry,
    children: &[AriaChild],
    depth: usize,
    out: &mut String,
) {
    for child in children {
        match child {
            AriaChild::Node(node) => render_node(doc, registry, node, depth, out),
            AriaChild::Text(text) => {
                let _ = writeln!(out, "{}- text {:?}", "  ".repeat(depth), text);
            }
        }
    }
}

fn render_node(doc: &Html, registry: &RefRegistry, node: &AriaNode, depth: usize, out: &mut String) {
    let _ = write!(out, "{}- {}", "  ".repeat(depth), node.role);
    if let Some(name) = &node.name {
        let _ = write!(out, " {name:?}");
    }
    for word in node.flags.words() {
        let _ = write!(out, " {word}");
    }
    let _ = writeln!(out, " [{}|{}]", node.token, live_selector(doc, registry, node));

    render_children(doc, registry, &node.children, depth + 1, out);
}

fn live_selector(doc: &Html, registry: &RefRegistry, node: &AriaNode) -> String {
    registry
        .resolve(&node.token)
        .and_then(|id| doc.tree.get(id))
        .and_then(ElementRef::wrap)
        .map(|el| synthesize(doc, el).selector)
        .unwrap_or_default()
}

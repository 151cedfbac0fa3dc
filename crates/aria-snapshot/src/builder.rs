//! Accessibility tree builder: one pre-order walk per snapshot request.
//!
//! Every visited element receives a reference token, including wrapper
//! nodes that are later elided from the emitted tree. Elision affects what
//! is rendered, never which references exist.

use scraper::{ElementRef, Html, Selector};
use std::time::SystemTime;
use tracing::debug;

use crate::errors::SnapshotError;
use crate::model::{AriaChild, AriaNode, AriaSnapshot, StateFlags};
use crate::name::{accessible_name, direct_text, normalize_ws};
use crate::registry::RefRegistry;
use crate::roles::{
    resolve_role, supports_checked, supports_disabled, supports_expanded, supports_selected,
};

/// Tags that never render content.
const NON_RENDERING_TAGS: &[&str] = &[
    "base", "head", "link", "meta", "noscript", "script", "style", "template", "title",
];

/// Build a snapshot of the document, starting a new reference generation.
///
/// `scope` optionally narrows the walk to the first element matching a CSS
/// selector; the default root is `<body>`.
pub fn build_snapshot(
    doc: &Html,
    registry: &mut RefRegistry,
    scope: Option<&str>,
) -> Result<AriaSnapshot, SnapshotError> {
    let root = match scope {
        Some(selector) => {
            let compiled =
                Selector::parse(selector).map_err(|err| SnapshotError::InvalidSelector {
                    selector: selector.to_string(),
                    reason: err.to_string(),
                })?;
            doc.select(&compiled)
                .next()
                .ok_or_else(|| SnapshotError::NotFound(format!("scope selector {selector:?}")))?
        }
        None => {
            let body = Selector::parse("body").expect("static selector");
            doc.select(&body)
                .next()
                .ok_or_else(|| SnapshotError::NotFound("document has no body".to_string()))?
        }
    };

    let generation = registry.begin_generation();
    let nodes = visit(doc, root, registry);
    debug!(
        target: "aria-snapshot",
        generation,
        refs = registry.len(),
        "snapshot built"
    );

    Ok(AriaSnapshot {
        generation,
        nodes,
        created_at: SystemTime::now(),
    })
}

/// What `el` contributes to its parent's child list: itself, or, when it
/// is an unnamed generic wrapper, its children spliced in order.
fn visit(doc: &Html, el: ElementRef<'_>, registry: &mut RefRegistry) -> Vec<AriaChild> {
    if !is_rendered(el) {
        return Vec::new();
    }

    let role = resolve_role(el);
    let name = accessible_name(doc, el, &role);
    // Reference issuance is unconditional so downstream consumers can keep
    // pointing at wrappers the rendered tree never shows.
    let token = registry.assign(el.id());

    let mut children = Vec::new();
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            let text = normalize_ws(text);
            if !text.is_empty() && Some(&text) != name.as_ref() {
                children.push(AriaChild::Text(text));
            }
        } else if let Some(child_el) = ElementRef::wrap(child) {
            children.extend(visit(doc, child_el, registry));
        }
    }

    if role == "generic" && name.is_none() {
        return children;
    }

    let mut node = AriaNode {
        flags: state_flags(el, &role),
        role,
        name,
        token,
        children,
    };

    // Nameless leaves keep their own direct text so the line is not blank.
    if node.name.is_none() && node.children.is_empty() {
        let text = direct_text(el);
        if !text.is_empty() {
            node.children.push(AriaChild::Text(text));
        }
    }

    vec![AriaChild::Node(node)]
}

fn is_rendered(el: ElementRef<'_>) -> bool {
    let element = el.value();
    if NON_RENDERING_TAGS.contains(&element.name()) {
        return false;
    }
    if element.attr("hidden").is_some() || element.attr("aria-hidden") == Some("true") {
        return false;
    }
    if let Some(style) = element.attr("style") {
        let flat: String = style.to_ascii_lowercase().split_whitespace().collect();
        if flat.contains("display:none") || flat.contains("visibility:hidden") {
            return false;
        }
    }
    true
}

fn state_flags(el: ElementRef<'_>, role: &str) -> StateFlags {
    let element = el.value();
    let mut flags = StateFlags::default();

    if supports_checked(role) {
        let checked =
            element.attr("aria-checked") == Some("true") || element.attr("checked").is_some();
        flags.checked = Some(checked);
    }

    if supports_disabled(role)
        && (element.attr("disabled").is_some() || element.attr("aria-disabled") == Some("true"))
    {
        flags.disabled = Some(true);
    }

    if supports_expanded(role) {
        flags.expanded = match element.attr("aria-expanded") {
            Some("true") => Some(true),
            Some(_) => Some(false),
            None => None,
        };
    }

    if supports_selected(role) {
        flags.selected = match element.attr("aria-selected") {
            Some("true") => Some(true),
            Some(_) => Some(false),
            None => {
                if element.name() == "option" && element.attr("selected").is_some() {
                    Some(true)
                } else {
                    None
                }
            }
        };
    }

    if role == "heading" {
        flags.level = element
            .attr("aria-level")
            .and_then(|level| level.parse().ok())
            .or_else(|| heading_level(element.name()));
    }

    flags
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RefToken;

    fn build(html: &str) -> (Html, RefRegistry, AriaSnapshot) {
        let doc = Html::parse_document(html);
        let mut registry = RefRegistry::new();
        let snapshot = build_snapshot(&doc, &mut registry, None).unwrap();
        (doc, registry, snapshot)
    }

    fn node(child: &AriaChild) -> &AriaNode {
        match child {
            AriaChild::Node(node) => node,
            AriaChild::Text(text) => panic!("expected node, got text {text:?}"),
        }
    }

    fn collect_tokens(children: &[AriaChild], out: &mut Vec<RefToken>) {
        for child in children {
            if let AriaChild::Node(node) = child {
                out.push(node.token);
                collect_tokens(&node.children, out);
            }
        }
    }

    #[test]
    fn unnamed_wrapper_is_elided_and_children_spliced() {
        let (_, _, snapshot) =
            build(r#"<div><button aria-label="Go">Text</button></div>"#);
        assert_eq!(snapshot.nodes.len(), 1);
        let button = node(&snapshot.nodes[0]);
        assert_eq!(button.role, "button");
        assert_eq!(button.name.as_deref(), Some("Go"));
    }

    #[test]
    fn splice_preserves_child_order() {
        let (_, _, snapshot) = build(
            r#"<div>
                <a href="/one">One</a>
                <div><a href="/two">Two</a></div>
                <a href="/three">Three</a>
            </div>"#,
        );
        let names: Vec<_> = snapshot
            .nodes
            .iter()
            .map(|c| node(c).name.clone().unwrap())
            .collect();
        assert_eq!(names, ["One", "Two", "Three"]);
    }

    #[test]
    fn elided_wrappers_still_receive_references() {
        let (_, registry, snapshot) = build(r#"<div><p>Hello</p></div>"#);
        // body + div + p all got tokens even though only p is emitted.
        assert_eq!(registry.len(), 3);
        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(node(&snapshot.nodes[0]).role, "paragraph");
    }

    #[test]
    fn reference_tokens_are_unique_within_a_snapshot() {
        let (_, _, snapshot) = build(
            r#"<ul><li><a href="/a">A</a></li><li><a href="/b">B</a></li></ul>"#,
        );
        let mut tokens = Vec::new();
        collect_tokens(&snapshot.nodes, &mut tokens);
        let mut deduped = tokens.clone();
        deduped.sort_by_key(|t| (t.generation, t.index));
        deduped.dedup();
        assert_eq!(tokens.len(), deduped.len());
    }

    #[test]
    fn hidden_subtrees_are_skipped() {
        let (_, _, snapshot) = build(
            r#"<button hidden>A</button>
               <button aria-hidden="true">B</button>
               <button style="display: none">C</button>
               <button style="visibility:hidden">D</button>
               <script>var x;</script>
               <button>E</button>"#,
        );
        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(node(&snapshot.nodes[0]).name.as_deref(), Some("E"));
    }

    #[test]
    fn checkbox_gets_checked_flag_button_does_not() {
        let (_, _, snapshot) = build(
            r#"<input type="checkbox" checked aria-label="Terms"><button>Go</button>"#,
        );
        let checkbox = node(&snapshot.nodes[0]);
        assert_eq!(checkbox.flags.checked, Some(true));
        let button = node(&snapshot.nodes[1]);
        assert_eq!(button.flags.checked, None);
    }

    #[test]
    fn heading_level_comes_from_tag_or_aria() {
        let (_, _, snapshot) =
            build(r#"<h2>Title</h2><div role="heading" aria-level="4">Sub</div>"#);
        assert_eq!(node(&snapshot.nodes[0]).flags.level, Some(2));
        assert_eq!(node(&snapshot.nodes[1]).flags.level, Some(4));
    }

    #[test]
    fn nameless_leaf_keeps_its_direct_text() {
        let (_, _, snapshot) = build(r#"<p>Plain words</p>"#);
        let paragraph = node(&snapshot.nodes[0]);
        assert!(paragraph.name.is_none());
        match &paragraph.children[0] {
            AriaChild::Text(text) => assert_eq!(text, "Plain words"),
            AriaChild::Node(_) => panic!("expected text child"),
        }
    }

    #[test]
    fn scope_narrows_the_walk() {
        let doc = Html::parse_document(
            r#"<nav><a href="/">Home</a></nav><main><button>Act</button></main>"#,
        );
        let mut registry = RefRegistry::new();
        let snapshot = build_snapshot(&doc, &mut registry, Some("main")).unwrap();
        assert_eq!(snapshot.nodes.len(), 1);
        let main = node(&snapshot.nodes[0]);
        assert_eq!(main.role, "main");
        assert_eq!(node(&main.children[0]).role, "button");
    }

    #[test]
    fn bad_scope_selector_is_reported_as_invalid() {
        let doc = Html::parse_document("<p>x</p>");
        let mut registry = RefRegistry::new();
        match build_snapshot(&doc, &mut registry, Some("p[")) {
            Err(SnapshotError::InvalidSelector { .. }) => {}
            other => panic!("expected InvalidSelector, got {other:?}"),
        }
    }

    #[test]
    fn generations_increment_per_build() {
        let doc = Html::parse_document("<button>Go</button>");
        let mut registry = RefRegistry::new();
        let first = build_snapshot(&doc, &mut registry, None).unwrap();
        let second = build_snapshot(&doc, &mut registry, None).unwrap();
        assert_eq!(first.generation + 1, second.generation);
    }
}

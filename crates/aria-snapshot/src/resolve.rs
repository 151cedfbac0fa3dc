//! Reference resolution for interaction handlers.
//!
//! The precise, generation-checked token path is always preferred; a
//! caller-supplied CSS selector is only consulted when the token yields
//! nothing. Stale tokens fail closed and are never re-guessed against
//! the current tree.

use scraper::{ElementRef, Html, Selector};
use std::str::FromStr;
use tracing::debug;

use crate::errors::SnapshotError;
use crate::model::RefToken;
use crate::registry::RefRegistry;

/// Resolve `ref_token` and/or `selector` to a live element.
pub fn resolve_target<'a>(
    doc: &'a Html,
    registry: &RefRegistry,
    ref_token: Option<&str>,
    selector: Option<&str>,
) -> Result<ElementRef<'a>, SnapshotError> {
    let mut token_failure: Option<SnapshotError> = None;

    if let Some(raw) = ref_token {
        match RefToken::from_str(raw) {
            Ok(token) => match registry.resolve(&token) {
                Some(node_id) => {
                    if let Some(el) = doc.tree.get(node_id).and_then(ElementRef::wrap) {
                        return Ok(el);
                    }
                    token_failure = Some(SnapshotError::NotFound(format!(
                        "reference {raw} no longer maps to an element"
                    )));
                }
                None => {
                    token_failure = Some(if token.generation != registry.generation() {
                        SnapshotError::StaleRef {
                            token: raw.to_string(),
                        }
                    } else {
                        SnapshotError::NotFound(format!("reference {raw}"))
                    });
                }
            },
            Err(err) => token_failure = Some(err),
        }
        if let Some(err) = &token_failure {
            debug!(target: "aria-snapshot", %err, "token path failed, trying selector fallback");
        }
    }

    if let Some(raw) = selector {
        let compiled = Selector::parse(raw).map_err(|err| SnapshotError::InvalidSelector {
            selector: raw.to_string(),
            reason: err.to_string(),
        })?;
        if let Some(el) = doc.select(&compiled).next() {
            return Ok(el);
        }
        return Err(token_failure
            .unwrap_or_else(|| SnapshotError::NotFound(format!("selector {raw:?}"))));
    }

    Err(token_failure
        .unwrap_or_else(|| SnapshotError::NotFound("no ref or selector supplied".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_snapshot;
    use crate::model::{AriaChild, AriaNode};

    fn first_node(children: &[AriaChild]) -> &AriaNode {
        children
            .iter()
            .find_map(|child| match child {
                AriaChild::Node(node) => Some(node),
                AriaChild::Text(_) => None,
            })
            .expect("node child")
    }

    #[test]
    fn token_path_is_preferred_over_selector() {
        let doc =
            Html::parse_document(r#"<button id="a">A</button><button id="b">B</button>"#);
        let mut registry = RefRegistry::new();
        let snapshot = build_snapshot(&doc, &mut registry, None).unwrap();
        let first = first_node(&snapshot.nodes);

        // Selector points at the other button; the token must win.
        let el = resolve_target(&doc, &registry, Some(&first.token.to_string()), Some("#b"))
            .unwrap();
        assert_eq!(el.value().attr("id"), Some("a"));
    }

    #[test]
    fn stale_token_falls_back_to_selector_when_present() {
        let doc = Html::parse_document(r#"<button id="a">A</button>"#);
        let mut registry = RefRegistry::new();
        let snapshot = build_snapshot(&doc, &mut registry, None).unwrap();
        let token = first_node(&snapshot.nodes).token.to_string();

        // A newer snapshot retires the token.
        build_snapshot(&doc, &mut registry, None).unwrap();

        let el = resolve_target(&doc, &registry, Some(&token), Some("#a")).unwrap();
        assert_eq!(el.value().attr("id"), Some("a"));
    }

    #[test]
    fn stale_token_without_selector_is_distinguishable() {
        let doc = Html::parse_document(r#"<button id="a">A</button>"#);
        let mut registry = RefRegistry::new();
        let snapshot = build_snapshot(&doc, &mut registry, None).unwrap();
        let token = first_node(&snapshot.nodes).token.to_string();
        build_snapshot(&doc, &mut registry, None).unwrap();

        match resolve_target(&doc, &registry, Some(&token), None) {
            Err(SnapshotError::StaleRef { token: t }) => assert_eq!(t, token),
            other => panic!("expected StaleRef, got {other:?}"),
        }
    }

    #[test]
    fn invalid_selector_is_not_a_not_found() {
        let doc = Html::parse_document("<p>x</p>");
        let registry = RefRegistry::new();
        match resolve_target(&doc, &registry, None, Some("p[")) {
            Err(SnapshotError::InvalidSelector { .. }) => {}
            other => panic!("expected InvalidSelector, got {other:?}"),
        }
    }

    #[test]
    fn missing_element_is_not_found() {
        let doc = Html::parse_document("<p>x</p>");
        let registry = RefRegistry::new();
        match resolve_target(&doc, &registry, None, Some("#nope")) {
            Err(SnapshotError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn malformed_token_is_reported() {
        let doc = Html::parse_document("<p>x</p>");
        let registry = RefRegistry::new();
        match resolve_target(&doc, &registry, Some("bogus"), None) {
            Err(SnapshotError::MalformedRef(_)) => {}
            other => panic!("expected MalformedRef, got {other:?}"),
        }
    }
}

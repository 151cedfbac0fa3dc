//! Accessible-name computation: a strict priority chain where the first
//! non-empty source wins.

use scraper::{ElementRef, Html};

/// Cap applied to every computed name before it reaches the tree.
pub const MAX_NAME_LEN: usize = 500;

const TRUNCATION_MARKER: char = '…';

/// Roles whose direct text content can serve as the accessible name.
const TEXT_NAMED_ROLES: &[&str] = &["button", "link", "heading"];

/// Compute the accessible name for `el`, or `None` when every source in the
/// chain is empty.
pub fn accessible_name(doc: &Html, el: ElementRef<'_>, role: &str) -> Option<String> {
    raw_name(doc, el, role).map(|name| truncate(&name))
}

fn raw_name(doc: &Html, el: ElementRef<'_>, role: &str) -> Option<String> {
    let element = el.value();
    let tag = element.name();

    if let Some(label) = non_empty(element.attr("aria-label")) {
        return Some(label);
    }

    if let Some(ids) = non_empty(element.attr("aria-labelledby")) {
        let joined = ids
            .split_whitespace()
            .filter_map(|id| find_by_id(doc, id))
            .map(|node| normalize_ws(&node.text().collect::<String>()))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.is_empty() {
            return Some(joined);
        }
    }

    if let Some(title) = non_empty(element.attr("title")) {
        return Some(title);
    }

    if tag == "img" || (tag == "input" && element.attr("type") == Some("image")) {
        if let Some(alt) = non_empty(element.attr("alt")) {
            return Some(alt);
        }
    }

    if matches!(tag, "input" | "textarea") {
        if let Some(placeholder) = non_empty(element.attr("placeholder")) {
            return Some(placeholder);
        }
    }

    if let Some(id) = element.attr("id") {
        if let Some(label) = find_label_for(doc, id) {
            let text = normalize_ws(&label.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    if TEXT_NAMED_ROLES.contains(&role) {
        let direct = direct_text(el);
        if !direct.is_empty() {
            return Some(direct);
        }
    }

    None
}

/// Direct (non-descendant) text of an element, whitespace-normalized.
pub fn direct_text(el: ElementRef<'_>) -> String {
    let joined = el
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_ws(&joined)
}

pub fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate at a char boundary and append the marker; no grapheme-level care
/// beyond not splitting a code point.
fn truncate(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_LEN {
        return name.to_string();
    }
    let mut out: String = name.chars().take(MAX_NAME_LEN).collect();
    out.push(TRUNCATION_MARKER);
    out
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(normalize_ws)
        .filter(|v| !v.is_empty())
}

fn find_by_id<'a>(doc: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    doc.tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().attr("id") == Some(id))
}

fn find_label_for<'a>(doc: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    doc.tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "label" && el.value().attr("for") == Some(id))
}

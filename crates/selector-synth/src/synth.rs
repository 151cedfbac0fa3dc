use scraper::{ElementRef, Html, Selector};
use tracing::trace;

use crate::stability::{is_stable_attr_value, is_stable_class, is_stable_id};

/// Ancestor hops tried before giving up on uniqueness.
const MAX_ANCESTOR_HOPS: usize = 10;

/// Stable attributes tried for a single-element part, in preference order.
const ATTR_PRIORITY: &[&str] = &[
    "data-testid",
    "data-test-id",
    "data-test",
    "aria-label",
    "name",
    "id",
    "placeholder",
    "title",
    "alt",
    "role",
    "type",
];

const MAX_STABLE_CLASSES: usize = 3;

/// Outcome of selector synthesis.
///
/// `unique` is false only when the bounded ancestor search was exhausted;
/// the selector is then a best-effort path and `matches` reports how many
/// elements it hits.
#[derive(Clone, Debug)]
pub struct SynthesizedSelector {
    pub selector: String,
    pub unique: bool,
    pub matches: usize,
}

/// Synthesize the shortest selector uniquely matching `target` in `doc`.
pub fn synthesize(doc: &Html, target: ElementRef<'_>) -> SynthesizedSelector {
    if let Some(found) = fast_path(doc, target) {
        return found;
    }

    let mut parts: Vec<String> = Vec::new();
    let mut current = target;

    loop {
        parts.push(element_part(current));
        let path = join_path(&parts);

        if let Some((count, hits_target)) = match_count(doc, &path, target) {
            trace!(target: "selector-synth", %path, count, "path candidate");
            if count == 1 && hits_target {
                return SynthesizedSelector {
                    selector: path,
                    unique: true,
                    matches: 1,
                };
            }
        }

        if parts.len() >= MAX_ANCESTOR_HOPS {
            break;
        }
        match parent_element(current) {
            Some(parent) if parent.value().name() != "html" => current = parent,
            _ => break,
        }
    }

    let path = join_path(&parts);
    let (matches, hits_target) = match_count(doc, &path, target).unwrap_or((0, false));
    SynthesizedSelector {
        selector: path,
        unique: matches == 1 && hits_target,
        matches,
    }
}

/// Single-part shortcuts that most hand-authored markup satisfies.
fn fast_path(doc: &Html, target: ElementRef<'_>) -> Option<SynthesizedSelector> {
    let element = target.value();

    if let Some(id) = element.attr("id") {
        if is_stable_id(id) {
            if let Some(found) = accept_if_unique(doc, target, format!("#{id}")) {
                return Some(found);
            }
        }
    }

    for attr in ["data-testid", "data-test-id", "data-test"] {
        if let Some(value) = element.attr(attr) {
            let candidate = format!("[{attr}=\"{}\"]", escape_attr_value(value));
            if let Some(found) = accept_if_unique(doc, target, candidate) {
                return Some(found);
            }
        }
    }

    if let Some(label) = element.attr("aria-label") {
        if !label.is_empty() {
            let candidate = format!("[aria-label=\"{}\"]", escape_attr_value(label));
            if let Some(found) = accept_if_unique(doc, target, candidate) {
                return Some(found);
            }
        }
    }

    if let Some(name) = element.attr("name") {
        if !name.is_empty() {
            let candidate = format!("[name=\"{}\"]", escape_attr_value(name));
            if let Some(found) = accept_if_unique(doc, target, candidate) {
                return Some(found);
            }
        }
    }

    None
}

fn accept_if_unique(
    doc: &Html,
    target: ElementRef<'_>,
    candidate: String,
) -> Option<SynthesizedSelector> {
    match match_count(doc, &candidate, target) {
        Some((1, true)) => Some(SynthesizedSelector {
            selector: candidate,
            unique: true,
            matches: 1,
        }),
        _ => None,
    }
}

/// Selector part for one element: stable attribute, stable classes, or
/// positional fallback, in that order.
fn element_part(el: ElementRef<'_>) -> String {
    let tag = el.value().name();

    for attr in ATTR_PRIORITY {
        if let Some(value) = el.value().attr(attr) {
            let stable = if *attr == "id" {
                is_stable_id(value)
            } else {
                is_stable_attr_value(value)
            };
            if stable {
                return if *attr == "id" {
                    format!("{tag}#{value}")
                } else {
                    format!("{tag}[{attr}=\"{}\"]", escape_attr_value(value))
                };
            }
        }
    }

    let classes: Vec<&str> = el
        .value()
        .classes()
        .filter(|c| is_stable_class(c))
        .take(MAX_STABLE_CLASSES)
        .collect();
    if !classes.is_empty() {
        return format!("{tag}.{}", classes.join("."));
    }

    let position = nth_of_type(el);
    if position > 1 || has_same_tag_following_sibling(el) {
        format!("{tag}:nth-of-type({position})")
    } else {
        tag.to_string()
    }
}

/// 1-based position among same-tag element siblings, matching CSS
/// `:nth-of-type` semantics.
fn nth_of_type(el: ElementRef<'_>) -> usize {
    let tag = el.value().name();
    el.prev_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|sibling| sibling.value().name() == tag)
        .count()
        + 1
}

fn has_same_tag_following_sibling(el: ElementRef<'_>) -> bool {
    let tag = el.value().name();
    el.next_siblings()
        .filter_map(ElementRef::wrap)
        .any(|sibling| sibling.value().name() == tag)
}

fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

fn join_path(parts: &[String]) -> String {
    let mut path: Vec<&str> = parts.iter().map(String::as_str).collect();
    path.reverse();
    path.join(" > ")
}

/// How many elements a selector hits, and whether the target is among them.
/// `None` means the candidate did not parse as a selector.
fn match_count(doc: &Html, selector: &str, target: ElementRef<'_>) -> Option<(usize, bool)> {
    let compiled = Selector::parse(selector).ok()?;
    let mut count = 0;
    let mut hits_target = false;
    for element in doc.select(&compiled) {
        count += 1;
        if element.id() == target.id() {
            hits_target = true;
        }
    }
    Some((count, hits_target))
}

fn escape_attr_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

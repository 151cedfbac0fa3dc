//! Heuristics for deciding whether an id, class or attribute value looks
//! hand-written (stable) or machine-generated (fragile).
//!
//! These are conservative pattern checks: rejecting a genuinely stable token
//! only costs selector brevity, while accepting a generated one produces
//! automation that breaks on the next build.

use once_cell::sync::Lazy;
use regex::Regex;

static HEX_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{6,}$").unwrap());
static LONG_DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4,}").unwrap());
static CSS_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[A-Za-z_][A-Za-z0-9_-]*$").unwrap());
static HASH_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[-_])[A-Za-z0-9]*\d[A-Za-z0-9]*\d[A-Za-z0-9]{3,}$").unwrap());

/// Prefixes emitted by framework id/class generators.
const GENERATED_PREFIXES: &[&str] = &[
    "ember-", "react-", "ng-", "svelte-", "radix-", "mui-", "css-", "sc-", "jsx-", "jss",
];

/// Utility classes describing transient state rather than element identity.
const STATE_CLASSES: &[&str] = &[
    "active", "inactive", "hover", "focus", "focused", "selected", "open", "closed", "show",
    "shown", "hide", "hidden", "visible", "disabled", "enabled", "checked", "expanded",
    "collapsed", "loading", "dirty", "invalid", "valid",
];

/// True when an `id` attribute looks hand-authored and safe to key a selector on.
pub fn is_stable_id(id: &str) -> bool {
    if id.is_empty() || id.len() > 64 || !CSS_IDENT.is_match(id) {
        return false;
    }
    if id.contains("--") || HEX_RUN.is_match(id) || LONG_DIGIT_RUN.is_match(id) {
        return false;
    }
    if GENERATED_PREFIXES
        .iter()
        .any(|p| id.to_ascii_lowercase().starts_with(p))
    {
        return false;
    }
    !HASH_TAIL.is_match(id)
}

/// True when a CSS class looks stable enough to appear in a synthesized path.
pub fn is_stable_class(class: &str) -> bool {
    if class.is_empty() || class.len() > 48 || !CSS_IDENT.is_match(class) {
        return false;
    }
    if class.starts_with('_') || class.contains("__") || class.contains("--") {
        return false;
    }
    if STATE_CLASSES.contains(&class.to_ascii_lowercase().as_str()) {
        return false;
    }
    if GENERATED_PREFIXES
        .iter()
        .any(|p| class.to_ascii_lowercase().starts_with(p))
    {
        return false;
    }
    !HEX_RUN.is_match(class) && !LONG_DIGIT_RUN.is_match(class) && !HASH_TAIL.is_match(class)
}

/// True when an attribute value is worth embedding in a selector part.
pub fn is_stable_attr_value(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 64
        && !value.contains('\n')
        && !LONG_DIGIT_RUN.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_written_ids_pass() {
        assert!(is_stable_id("login-form"));
        assert!(is_stable_id("search"));
        assert!(is_stable_id("nav_main"));
    }

    #[test]
    fn generated_ids_are_rejected() {
        assert!(!is_stable_id("a3f9c2e1b4"));
        assert!(!is_stable_id("ember-349"));
        assert!(!is_stable_id("react-select-2-input"));
        assert!(!is_stable_id("field-19283745"));
        assert!(!is_stable_id("radix--r1--content"));
        assert!(!is_stable_id(""));
    }

    #[test]
    fn hash_style_classes_are_rejected() {
        assert!(!is_stable_class("css-1q2w3e"));
        assert!(!is_stable_class("_3xYz9a"));
        assert!(!is_stable_class("Button_root__x9Ya2k"));
        assert!(!is_stable_class("sc-bdVaJa"));
        assert!(is_stable_class("btn-primary"));
        assert!(is_stable_class("toolbar"));
    }

    #[test]
    fn state_utility_classes_are_rejected() {
        assert!(!is_stable_class("active"));
        assert!(!is_stable_class("Hidden"));
        assert!(is_stable_class("sidebar"));
    }

    #[test]
    fn digit_heavy_attr_values_are_rejected() {
        assert!(is_stable_attr_value("Submit order"));
        assert!(!is_stable_attr_value("row-88217345"));
        assert!(!is_stable_attr_value(""));
    }
}

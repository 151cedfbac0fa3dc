//! ARIA role resolution: explicit `role` attribute first, then an implicit
//! `(tag, input-type)` table, then interactivity fallbacks.

use scraper::ElementRef;

/// Natively interactive tags; a wrapper containing one of these is never
/// elided from the emitted tree.
pub const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea", "summary"];

/// Resolve the ARIA role for an element.
pub fn resolve_role(el: ElementRef<'_>) -> String {
    let element = el.value();

    if let Some(explicit) = element.attr("role") {
        let role = explicit.split_whitespace().next().unwrap_or("");
        if !role.is_empty() {
            // presentation/none strip semantics; fold them into generic.
            return if role == "presentation" || role == "none" {
                "generic".to_string()
            } else {
                role.to_string()
            };
        }
    }

    let tag = element.name();
    if let Some(implicit) = implicit_role(tag, element.attr("type")) {
        return implicit.to_string();
    }

    // Unmapped tags wired for interaction read as buttons.
    if element.attr("onclick").is_some() || element.attr("tabindex").is_some() {
        return "button".to_string();
    }

    "generic".to_string()
}

fn implicit_role(tag: &str, input_type: Option<&str>) -> Option<&'static str> {
    let role = match tag {
        "a" => "link",
        "article" => "article",
        "aside" => "complementary",
        "button" => "button",
        "details" => "group",
        "dialog" => "dialog",
        "fieldset" => "group",
        "footer" => "contentinfo",
        "form" => "form",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "header" => "banner",
        "hr" => "separator",
        "img" => "img",
        "input" => return Some(input_role(input_type.unwrap_or("text"))),
        "li" => "listitem",
        "main" => "main",
        "nav" => "navigation",
        "ol" | "ul" => "list",
        "optgroup" => "group",
        "option" => "option",
        "output" => "status",
        "p" => "paragraph",
        "progress" => "progressbar",
        "section" => "region",
        "select" => "combobox",
        "summary" => "button",
        "table" => "table",
        "tbody" | "thead" | "tfoot" => "rowgroup",
        "td" => "cell",
        "textarea" => "textbox",
        "th" => "columnheader",
        "tr" => "row",
        _ => return None,
    };
    Some(role)
}

fn input_role(input_type: &str) -> &'static str {
    match input_type.to_ascii_lowercase().as_str() {
        "checkbox" => "checkbox",
        "radio" => "radio",
        "button" | "submit" | "reset" | "image" => "button",
        "range" => "slider",
        "number" => "spinbutton",
        "search" => "searchbox",
        _ => "textbox",
    }
}

pub fn supports_checked(role: &str) -> bool {
    matches!(
        role,
        "checkbox" | "radio" | "switch" | "menuitemcheckbox" | "menuitemradio"
    )
}

pub fn supports_disabled(role: &str) -> bool {
    matches!(
        role,
        "button"
            | "checkbox"
            | "combobox"
            | "listbox"
            | "menuitem"
            | "option"
            | "radio"
            | "searchbox"
            | "slider"
            | "spinbutton"
            | "switch"
            | "textbox"
    )
}

pub fn supports_expanded(role: &str) -> bool {
    matches!(role, "button" | "combobox" | "listbox" | "treeitem" | "row")
}

pub fn supports_selected(role: &str) -> bool {
    matches!(role, "option" | "tab" | "treeitem" | "row" | "cell")
}

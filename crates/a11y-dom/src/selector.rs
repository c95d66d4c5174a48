//! Selector generation for detected nodes
//!
//! Tie-break order:
//! 1. `#id` when the element has an id
//! 2. `tag.class1.class2` when it has classes
//! 3. `tag:nth-of-type(n)` among same-tag siblings, or bare `tag` when it has none
//!
//! The result is not guaranteed unique across the whole tree. Re-resolve it
//! against the same document instance it was generated from.
//!
//! [`path_selector`] trades readability for precision: a child-combinator
//! chain from the nearest ancestor with an id (or the root) down to the node.

use scraper::ElementRef;

/// Generate a selector for `element`
#[must_use]
pub fn unique_selector(element: ElementRef<'_>) -> String {
    let value = element.value();
    let tag = value.name();

    if let Some(id) = value.id().filter(|id| !id.is_empty()) {
        return if is_plain_ident(id) {
            format!("#{id}")
        } else {
            format!("{tag}[id=\"{}\"]", id.replace('"', "\\\""))
        };
    }

    let classes: Vec<&str> = value.classes().filter(|c| is_plain_ident(c)).collect();
    if !classes.is_empty() {
        return format!("{tag}.{}", classes.join("."));
    }

    step(element)
}

/// Generate a child-combinator path addressing exactly `element`
///
/// Each step is `tag` or `tag:nth-of-type(n)`; the chain starts at the
/// nearest ancestor-or-self with a plain id, else at the root element.
#[must_use]
pub fn path_selector(element: ElementRef<'_>) -> String {
    let mut steps = Vec::new();
    let mut current = Some(element);
    while let Some(el) = current {
        if let Some(id) = el.value().id().filter(|id| is_plain_ident(id)) {
            steps.push(format!("#{id}"));
            break;
        }
        steps.push(step(el));
        current = el.parent().and_then(ElementRef::wrap);
    }
    steps.reverse();
    steps.join(" > ")
}

fn step(element: ElementRef<'_>) -> String {
    let tag = element.value().name();
    let same_tag = |node: &ego_tree::NodeRef<'_, scraper::Node>| {
        node.value().as_element().is_some_and(|e| e.name() == tag)
    };
    let siblings = element
        .parent()
        .map_or(1, |parent| parent.children().filter(same_tag).count());
    if siblings > 1 {
        let position = element.prev_siblings().filter(same_tag).count() + 1;
        format!("{tag}:nth-of-type({position})")
    } else {
        tag.to_string()
    }
}

/// Whether `s` can be written as a CSS identifier without escaping
fn is_plain_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '-' => {}
        _ => return false,
    }
    !s.starts_with("--") && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

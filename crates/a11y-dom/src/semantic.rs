//! Semantic condensation of a document for prompting
//!
//! Walks the body and writes only what carries meaning for a reader of the
//! page structure:
//! - media, embeds, scripts, styles, metadata and comments are dropped
//! - landmark chrome (`header`, `footer`, `nav`, `aside`, banner/navigation roles) is dropped
//! - form field controls are dropped; buttons and links stay
//! - every attribute except `id` and `class` is dropped
//! - elements left without text are dropped, except buttons and links
//!
//! The result is truncated to a character budget. Truncation is the
//! prompt-size control, so it always applies.

use crate::document::HtmlDocument;
use crate::render::{escape_text, is_void, start_tag};
use scraper::{ElementRef, Node};

/// Default character budget for condensed markup
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 12_000;

const DROPPED_ELEMENTS: &[&str] = &[
    // media
    "img", "svg", "picture", "video", "audio", "canvas", "iframe", "object", "embed",
    // code and presentation
    "script", "style", "noscript", "template", "link",
    // metadata
    "meta", "base", "title",
    // landmarks
    "header", "footer", "nav", "aside",
    // form fields
    "input", "textarea", "select", "option", "datalist",
];

const DROPPED_ROLES: &[&str] = &["banner", "navigation"];

const KEPT_WHEN_EMPTY: &[&str] = &["button", "a"];

const KEPT_ATTRIBUTES: &[&str] = &["id", "class"];

/// Condense the body of `doc` to semantic markup of at most `max_chars` characters
#[must_use]
pub fn condense(doc: &HtmlDocument, max_chars: usize) -> String {
    let mut out = String::new();
    write_children(&mut out, doc.body());
    truncate_chars(out.trim(), max_chars).to_string()
}

fn write_children(out: &mut String, element: ElementRef<'_>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => write_text(out, text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    write_element(out, child_el);
                }
            }
            _ => {}
        }
    }
}

fn write_element(out: &mut String, element: ElementRef<'_>) {
    let value = element.value();
    let name = value.name();
    if DROPPED_ELEMENTS.contains(&name)
        || value
            .attr("role")
            .is_some_and(|role| DROPPED_ROLES.contains(&role.trim()))
    {
        return;
    }

    let mut inner = String::new();
    if !is_void(name) {
        write_children(&mut inner, element);
    }
    if inner.trim().is_empty() && !KEPT_WHEN_EMPTY.contains(&name) {
        return;
    }

    let attrs = KEPT_ATTRIBUTES
        .iter()
        .filter_map(|&key| value.attr(key).map(|v| (key, v)));
    start_tag(out, name, attrs);
    out.push_str(&inner);
    if !is_void(name) {
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
}

fn write_text(out: &mut String, text: &str) {
    let mut last_was_space = out.ends_with(' ');
    let mut collapsed = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                collapsed.push(' ');
                last_was_space = true;
            }
        } else {
            collapsed.push(c);
            last_was_space = false;
        }
    }
    escape_text(out, &collapsed);
}

/// Longest prefix of `s` with at most `max_chars` characters
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

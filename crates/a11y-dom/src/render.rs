//! Minimal HTML writers for markup the crate builds itself

use std::fmt::Write;

/// Elements without a closing tag
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub(crate) fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub(crate) fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

pub(crate) fn escape_attr(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

pub(crate) fn start_tag<K, V>(out: &mut String, name: &str, attrs: impl IntoIterator<Item = (K, V)>)
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let _ = write!(out, "<{name}");
    for (key, value) in attrs {
        let _ = write!(out, " {}=\"", key.as_ref());
        escape_attr(out, value.as_ref());
        out.push('"');
    }
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_quotes_are_escaped() {
        let mut out = String::new();
        start_tag(&mut out, "img", [("alt", "a \"quoted\" & more")]);
        assert_eq!(out, "<img alt=\"a &quot;quoted&quot; &amp; more\">");
    }

    #[test]
    fn text_angle_brackets_are_escaped() {
        let mut out = String::new();
        escape_text(&mut out, "1 < 2 & 3 > 2");
        assert_eq!(out, "1 &lt; 2 &amp; 3 &gt; 2");
    }
}

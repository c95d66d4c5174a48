//! Fix application
//!
//! A batch of [`Patch`]es is applied in two phases:
//! 1. **Snapshot**: every selector is resolved against one read of the
//!    document, before anything changes.
//! 2. **Apply**: nodes are replaced in batch order. A node that an earlier
//!    replacement already detached is reported as [`PatchOutcome::Stale`].
//!
//! Unresolvable entries never abort the batch. They are reported per entry
//! and logged as application warnings.

use crate::document::{parse_selector, HtmlDocument};
use ego_tree::{NodeId, NodeRef, Tree};
use percent_encoding::percent_decode_str;
use scraper::{Html, Node};
use std::borrow::Cow;
use tracing::{debug, warn};

/// One replacement request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Node to replace
    pub selector: String,
    /// Replacement outer markup, possibly percent-encoded
    pub markup: String,
}

impl Patch {
    /// Create a patch
    #[inline]
    #[must_use]
    pub fn new(selector: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            markup: markup.into(),
        }
    }
}

/// Terminal state of one patch entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Node replaced
    Applied,
    /// Selector matched nothing in the snapshot
    NotFound,
    /// Target was detached by an earlier entry in the same batch
    Stale,
    /// Selector text does not parse
    InvalidSelector(String),
}

impl PatchOutcome {
    /// Whether the entry changed the document
    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Per-entry record of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchEntry {
    /// Selector as supplied
    pub selector: String,
    /// What happened
    pub outcome: PatchOutcome,
}

/// Result of applying a batch, in batch order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSummary {
    /// One entry per patch
    pub entries: Vec<PatchEntry>,
}

impl PatchSummary {
    /// Number of entries that changed the document
    #[must_use]
    pub fn applied(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_applied()).count()
    }

    /// Entries that did not apply
    pub fn warnings(&self) -> impl Iterator<Item = &PatchEntry> {
        self.entries.iter().filter(|e| !e.outcome.is_applied())
    }
}

/// Applies patch batches to a document
#[derive(Debug, Clone, Copy, Default)]
pub struct FixApplier;

impl FixApplier {
    /// Create an applier
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Apply `patches` to `doc` and report each entry's outcome
    ///
    /// # Arguments
    /// * `doc` - Document to mutate in place
    /// * `patches` - Replacements, applied in order
    ///
    /// # Returns
    /// Per-entry outcomes. A document with no applied entry keeps its
    /// original source for serialization.
    pub fn apply(&self, doc: &mut HtmlDocument, patches: &[Patch]) -> PatchSummary {
        let targets = snapshot(doc.html(), patches);

        if !targets.iter().any(Result::is_ok) {
            return finish(patches, targets.into_iter().filter_map(Result::err));
        }

        let html = doc.html_mut();
        let mut outcomes = Vec::with_capacity(patches.len());
        for (patch, target) in patches.iter().zip(targets) {
            let outcome = match target {
                Ok(id) => replace(html, id, &decode_markup(&patch.markup)),
                Err(outcome) => outcome,
            };
            outcomes.push(outcome);
        }
        finish(patches, outcomes)
    }
}

fn snapshot(html: &Html, patches: &[Patch]) -> Vec<Result<NodeId, PatchOutcome>> {
    patches
        .iter()
        .map(|patch| {
            let selector = parse_selector(&patch.selector)
                .map_err(|e| PatchOutcome::InvalidSelector(e.to_string()))?;
            html.select(&selector)
                .next()
                .map(|el| el.id())
                .ok_or(PatchOutcome::NotFound)
        })
        .collect()
}

fn finish(patches: &[Patch], outcomes: impl IntoIterator<Item = PatchOutcome>) -> PatchSummary {
    let entries = patches
        .iter()
        .zip(outcomes)
        .map(|(patch, outcome)| {
            match &outcome {
                PatchOutcome::Applied => debug!(selector = %patch.selector, "patch applied"),
                other => warn!(selector = %patch.selector, outcome = ?other, "patch skipped"),
            }
            PatchEntry {
                selector: patch.selector.clone(),
                outcome,
            }
        })
        .collect();
    PatchSummary { entries }
}

/// Replace the node `target` with the nodes parsed from `markup`
fn replace(html: &mut Html, target: NodeId, markup: &str) -> PatchOutcome {
    if !is_attached(&html.tree, target) {
        return PatchOutcome::Stale;
    }
    let fragment = Html::parse_fragment(markup);
    for child in fragment.root_element().children() {
        let Some(mut anchor) = html.tree.get_mut(target) else {
            return PatchOutcome::Stale;
        };
        let copied = anchor.insert_before(child.value().clone()).id();
        copy_children(&mut html.tree, copied, child);
    }
    if let Some(mut node) = html.tree.get_mut(target) {
        node.detach();
    }
    PatchOutcome::Applied
}

fn copy_children(tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<'_, Node>) {
    for child in source.children() {
        let Some(mut node) = tree.get_mut(parent) else {
            return;
        };
        let copied = node.append(child.value().clone()).id();
        copy_children(tree, copied, child);
    }
}

fn is_attached(tree: &Tree<Node>, id: NodeId) -> bool {
    let root = tree.root().id();
    tree.get(id)
        .is_some_and(|node| node.id() == root || node.ancestors().any(|a| a.id() == root))
}

/// Percent-decode proposed markup, keeping the raw text when it is not valid UTF-8 once decoded
#[must_use]
pub fn decode_markup(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8().unwrap_or(Cow::Borrowed(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_handles_encoded_and_plain() {
        assert_eq!(decode_markup("%3Cb%3Ehi%3C%2Fb%3E"), "<b>hi</b>");
        assert_eq!(decode_markup("<b>hi</b>"), "<b>hi</b>");
        assert_eq!(decode_markup("%FF<b>"), "%FF<b>");
    }

    #[test]
    fn replaces_target_node() {
        let mut doc = HtmlDocument::parse("<div><button id=\"b\"></button></div>").unwrap();
        let summary = FixApplier::new().apply(
            &mut doc,
            &[Patch::new("#b", "<button id=\"b\" aria-label=\"Close\"></button>")],
        );
        assert_eq!(summary.applied(), 1);
        let out = doc.serialize();
        assert!(out.contains("aria-label=\"Close\""));
        assert_eq!(out.matches("<button").count(), 1);
    }

    #[test]
    fn missing_selector_leaves_source_untouched() {
        let src = "<html><body><P>keep   me</body></html>";
        let mut doc = HtmlDocument::parse(src).unwrap();
        let summary = FixApplier::new().apply(&mut doc, &[Patch::new("#nope", "<p>x</p>")]);
        assert_eq!(summary.entries[0].outcome, PatchOutcome::NotFound);
        assert_eq!(doc.serialize(), src);
    }

    #[test]
    fn invalid_selector_is_reported() {
        let mut doc = HtmlDocument::parse("<p>x</p>").unwrap();
        let summary = FixApplier::new().apply(&mut doc, &[Patch::new("p[", "<p>y</p>")]);
        assert!(matches!(summary.entries[0].outcome, PatchOutcome::InvalidSelector(_)));
        assert_eq!(summary.warnings().count(), 1);
    }

    #[test]
    fn child_of_replaced_node_is_stale() {
        let mut doc =
            HtmlDocument::parse("<div id=\"outer\"><span id=\"inner\">a</span></div>").unwrap();
        let summary = FixApplier::new().apply(
            &mut doc,
            &[
                Patch::new("#outer", "<section id=\"outer\">b</section>"),
                Patch::new("#inner", "<span id=\"inner\">c</span>"),
            ],
        );
        assert_eq!(summary.entries[0].outcome, PatchOutcome::Applied);
        assert_eq!(summary.entries[1].outcome, PatchOutcome::Stale);
        let out = doc.serialize();
        assert!(out.contains("<section id=\"outer\">b</section>"));
        assert!(!out.contains("inner"));
    }

    #[test]
    fn replacement_may_expand_to_several_nodes() {
        let mut doc = HtmlDocument::parse("<main><p id=\"p\">x</p></main>").unwrap();
        FixApplier::new().apply(&mut doc, &[Patch::new("#p", "<h2>T</h2><p>x</p>")]);
        assert!(doc.serialize().contains("<main><h2>T</h2><p>x</p></main>"));
    }
}

//! Task Classifier
//!
//! Total mapping from [`Issue`] to [`Task`]:
//! 1. Extract the WCAG success criterion from the issue code
//!    (`WCAG2AA.Principle1.Guideline1_1.1_1_1.H30.2` → `1.1.1`)
//! 2. Look it up in the [`WcagMappingTable`]
//! 3. Otherwise match keywords in the message, in fixed precedence
//! 4. Otherwise [`Task::SemanticStructure`]

use a11y_model::{Issue, Task, WcagMappingTable};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static WCAG_CODE: Lazy<Regex> = Lazy::new(|| {
    let pattern = r"WCAG2AA\.(Principle\d+\.Guideline\d+_\d+\.)?(\d+_\d+_\d+)";
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid regex {pattern}: {err}"))
});

/// Message keywords per task, in precedence order
const KEYWORDS: &[(Task, &[&str])] = &[
    (Task::AltText, &["alt", "image", "non-text"]),
    (Task::Button, &["button", "link", "control"]),
    (Task::SkipContent, &["skip", "bypass", "navigation"]),
];

/// Dotted success criterion id embedded in a scanner code, if any
#[must_use]
pub fn wcag_id(code: &str) -> Option<String> {
    WCAG_CODE
        .captures(code)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().replace('_', "."))
}

/// Classifier over an immutable mapping table
#[derive(Debug, Clone, Copy)]
pub struct TaskClassifier<'a> {
    table: &'a WcagMappingTable,
}

impl<'a> TaskClassifier<'a> {
    /// Create a classifier reading `table`
    #[inline]
    #[must_use]
    pub fn new(table: &'a WcagMappingTable) -> Self {
        Self { table }
    }

    /// Task for one issue
    #[must_use]
    pub fn classify(&self, issue: &Issue) -> Task {
        if let Some(task) = wcag_id(&issue.code).and_then(|id| self.table.lookup(&id)) {
            return task;
        }
        let message = issue.message.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| message.contains(w)))
            .map_or(Task::SemanticStructure, |(task, _)| *task)
    }

    /// Fill in `task_type` on every issue
    pub fn classify_all(&self, issues: &mut [Issue]) {
        for issue in issues.iter_mut() {
            let task = self.classify(issue);
            issue.task_type = Some(task);
        }
        debug!(issues = issues.len(), "issues classified");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(code: &str, message: &str) -> Task {
        let table = WcagMappingTable::standard();
        TaskClassifier::new(&table).classify(&Issue::new(code, message))
    }

    #[test]
    fn extracts_criterion_with_and_without_guideline() {
        assert_eq!(
            wcag_id("WCAG2AA.Principle1.Guideline1_1.1_1_1.H30.2").as_deref(),
            Some("1.1.1")
        );
        assert_eq!(wcag_id("WCAG2AA.1_3_1.button-name").as_deref(), Some("1.3.1"));
        assert_eq!(wcag_id("A11Y.custom.control-semantics"), None);
    }

    #[test]
    fn missing_alt_scanner_issue_is_alt_text() {
        assert_eq!(
            classify("WCAG2AA.Principle1.Guideline1_1.1_1_1.H30.2", "Img element is missing alt text"),
            Task::AltText
        );
    }

    #[test]
    fn table_wins_over_message() {
        assert_eq!(
            classify("WCAG2AA.Principle2.Guideline2_4.2_4_1.G1", "Image button without alt"),
            Task::SkipContent
        );
    }

    #[test]
    fn unmapped_code_falls_back_to_keywords() {
        assert_eq!(classify("WCAG2AA.1_3_1.button-name", "Button has no name"), Task::Button);
        assert_eq!(classify("x", "Provide a way to BYPASS blocks"), Task::SkipContent);
        assert_eq!(classify("x", "Heading levels skipped"), Task::SkipContent);
    }

    #[test]
    fn keyword_precedence_is_alt_first() {
        assert_eq!(classify("x", "Image link has no text"), Task::AltText);
        assert_eq!(classify("x", "Navigation link is vague"), Task::Button);
    }

    #[test]
    fn anything_else_is_semantic_structure() {
        assert_eq!(classify("", ""), Task::SemanticStructure);
        assert_eq!(classify("x", "Heading order is wrong"), Task::SemanticStructure);
    }

    #[test]
    fn classify_all_fills_every_issue() {
        let table = WcagMappingTable::standard();
        let mut issues = vec![Issue::new("a", "image"), Issue::new("b", "table")];
        TaskClassifier::new(&table).classify_all(&mut issues);
        assert!(issues.iter().all(Issue::is_classified));
    }
}

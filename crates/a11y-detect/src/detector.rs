//! Custom Detector
//!
//! Finds issues the external scanner misses:
//! - **Button names** (deterministic): button-like elements with no text,
//!   no non-empty `aria-label` and no `aria-labelledby`
//! - **Control semantics** (model-judged): the condensed body is sent to the
//!   gateway, which flags interactive controls with unclear purpose
//!
//! Selectors in the result are generated from the document passed in and
//! must be resolved against that same instance.

use crate::error::DetectError;
use a11y_dom::{condense, unique_selector, HtmlDocument, DEFAULT_MAX_PROMPT_CHARS};
use a11y_llm::prompts::envelope_instructions;
use a11y_llm::{GenerationError, LlmGateway};
use a11y_model::{Issue, CUSTOM_DETECTOR_RUNNER};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Issue code for button-like elements without an accessible name
pub const BUTTON_NAME_CODE: &str = "WCAG2AA.1_3_1.button-name";

/// Issue code for controls flagged by the semantic rule
pub const CONTROL_SEMANTICS_CODE: &str = "A11Y.custom.control-semantics";

const BUTTON_LIKE: &str = r#"button, [role="button"]"#;

/// One finding reported by the semantic rule
#[derive(Debug, Deserialize)]
struct SemanticFinding {
    selector: String,
    message: String,
    #[serde(default)]
    context: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SemanticFindings {
    issues: Vec<SemanticFinding>,
}

/// In-process detector
#[derive(Debug, Clone)]
pub struct CustomDetector {
    gateway: Option<LlmGateway>,
    max_prompt_chars: usize,
}

impl Default for CustomDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomDetector {
    /// Detector running only the deterministic rule
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            gateway: None,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
        }
    }

    /// Enable the semantic rule through `gateway`
    #[inline]
    #[must_use]
    pub fn with_gateway(mut self, gateway: LlmGateway) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// With character budget for the semantic prompt
    #[inline]
    #[must_use]
    pub fn with_max_prompt_chars(mut self, max_prompt_chars: usize) -> Self {
        self.max_prompt_chars = max_prompt_chars;
        self
    }

    /// Whether the semantic rule will run
    #[inline]
    #[must_use]
    pub fn has_semantic_rule(&self) -> bool {
        self.gateway.is_some()
    }

    /// Run every enabled rule
    ///
    /// # Errors
    /// - `DetectError::Generation` if the semantic call fails
    pub async fn detect(&self, doc: &HtmlDocument) -> Result<Vec<Issue>, DetectError> {
        let mut issues = self.detect_button_names(doc)?;
        if let Some(gateway) = &self.gateway {
            issues.extend(self.detect_control_semantics(gateway, doc).await?);
        }
        info!(issues = issues.len(), "custom detection complete");
        Ok(issues)
    }

    /// Button-like elements lacking an accessible name
    ///
    /// # Errors
    /// - `DetectError::Dom` if the built-in selector fails to parse
    pub fn detect_button_names(&self, doc: &HtmlDocument) -> Result<Vec<Issue>, DetectError> {
        let issues: Vec<Issue> = doc
            .select_all(BUTTON_LIKE)?
            .into_iter()
            .filter(|el| {
                let has_text = el.text().any(|t| !t.trim().is_empty());
                let has_label = el
                    .value()
                    .attr("aria-label")
                    .is_some_and(|l| !l.trim().is_empty());
                let has_labelledby = el.value().attr("aria-labelledby").is_some();
                !(has_text || has_label || has_labelledby)
            })
            .map(|el| {
                Issue::new(BUTTON_NAME_CODE, "Button does not have an accessible name")
                    .with_type("error")
                    .with_context(el.html())
                    .with_selector(unique_selector(el))
                    .with_runner(CUSTOM_DETECTOR_RUNNER)
            })
            .collect();
        debug!(issues = issues.len(), "button name rule");
        Ok(issues)
    }

    async fn detect_control_semantics(
        &self,
        gateway: &LlmGateway,
        doc: &HtmlDocument,
    ) -> Result<Vec<Issue>, DetectError> {
        let condensed = condense(doc, self.max_prompt_chars);
        if condensed.is_empty() {
            return Ok(Vec::new());
        }

        let findings = gateway
            .solve_validated(&semantic_prompt(&condensed), |payload: Value| {
                serde_json::from_value::<SemanticFindings>(payload)
                    .map_err(|e| GenerationError::json_invalid(e.to_string()))
            })
            .await?;

        let mut issues = Vec::with_capacity(findings.issues.len());
        for finding in findings.issues {
            let element = match doc.select_first(&finding.selector) {
                Ok(Some(el)) => el,
                Ok(None) => {
                    warn!(selector = %finding.selector, "semantic finding does not resolve, dropped");
                    continue;
                }
                Err(e) => {
                    warn!(selector = %finding.selector, error = %e, "semantic finding has invalid selector, dropped");
                    continue;
                }
            };
            let context = finding
                .context
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| element.html());
            issues.push(
                Issue::new(CONTROL_SEMANTICS_CODE, finding.message)
                    .with_type("warning")
                    .with_context(context)
                    .with_selector(finding.selector)
                    .with_runner(CUSTOM_DETECTOR_RUNNER),
            );
        }
        debug!(issues = issues.len(), "control semantics rule");
        Ok(issues)
    }
}

fn semantic_prompt(condensed: &str) -> String {
    format!(
        "Review this page markup for interactive controls whose purpose would be unclear to a \
         screen reader user: links or buttons with vague text such as \"click here\" or \"more\", \
         labels that do not describe the action, and clickable elements that are neither links \
         nor buttons. Report only real problems. Use CSS selectors built from the ids and classes \
         present in the markup.\n\n{condensed}\n\n{}",
        envelope_instructions(
            r#"{"issues": [{"selector": "...", "message": "...", "context": "<offending markup>"}]}"#
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use a11y_llm::backend::{CompletionBackend, CompletionRequest};
    use a11y_llm::TransportError;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct CannedBackend {
        replies: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionBackend for CannedBackend {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, TransportError> {
            let mut replies = self.replies.lock().unwrap();
            Ok(if replies.is_empty() { String::new() } else { replies.remove(0) })
        }

        async fn list_models(&self) -> Result<Vec<String>, TransportError> {
            Ok(Vec::new())
        }
    }

    fn gateway(reply: &str) -> LlmGateway {
        LlmGateway::new(Arc::new(CannedBackend {
            replies: Mutex::new(vec![reply.to_string()]),
        }))
    }

    #[test]
    fn unnamed_button_yields_one_issue() {
        let doc = HtmlDocument::parse("<main><button class=\"icon\"></button></main>").unwrap();
        let issues = CustomDetector::new().detect_button_names(&doc).unwrap();
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert!(issue.code.ends_with("button-name"));
        assert_eq!(issue.runner, "custom-detector");
        assert_eq!(issue.selector, "button.icon");
        assert_eq!(issue.context, "<button class=\"icon\"></button>");
    }

    #[test]
    fn named_buttons_pass() {
        let doc = HtmlDocument::parse(
            r#"<button>Save</button>
               <button aria-label="Close"></button>
               <button aria-labelledby="lbl"></button>
               <div role="button"><span>Open</span></div>"#,
        )
        .unwrap();
        assert!(CustomDetector::new().detect_button_names(&doc).unwrap().is_empty());
    }

    #[test]
    fn blank_label_and_role_button_are_flagged() {
        let doc = HtmlDocument::parse(
            r#"<button aria-label="  "> </button><div id="fake" role="button"></div>"#,
        )
        .unwrap();
        let issues = CustomDetector::new().detect_button_names(&doc).unwrap();
        let selectors: Vec<_> = issues.iter().map(|i| i.selector.as_str()).collect();
        assert_eq!(selectors, vec!["button", "#fake"]);
    }

    #[tokio::test]
    async fn semantic_findings_become_warnings() {
        let doc = HtmlDocument::parse(r#"<p>Offers <a id="more" href="/x">click here</a></p>"#).unwrap();
        let reply = r##"<fix_output>{"issues": [
            {"selector": "#more", "message": "Link text does not describe its target"},
            {"selector": "#ghost", "message": "Not in the page"},
            {"selector": "a[", "message": "Broken selector"}
        ]}</fix_output>"##;
        let detector = CustomDetector::new().with_gateway(gateway(reply));
        let issues = detector.detect(&doc).await.unwrap();

        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.code, CONTROL_SEMANTICS_CODE);
        assert_eq!(issue.issue_type, "warning");
        assert_eq!(issue.selector, "#more");
        assert!(issue.context.contains("click here"));
    }

    #[tokio::test]
    async fn semantic_rule_failure_is_fatal() {
        let doc = HtmlDocument::parse("<p><a href=\"/\">x</a></p>").unwrap();
        let detector = CustomDetector::new().with_gateway(gateway("no envelope here"));
        let err = detector.detect(&doc).await.unwrap_err();
        assert!(matches!(err, DetectError::Generation(_)));
    }
}

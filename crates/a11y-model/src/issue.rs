//! Normalized accessibility issue
//!
//! Both the external scanner and the custom detector produce [`Issue`]
//! values of the same shape. After creation the only field that changes is
//! `task_type`, filled in once by classification.

use crate::task::Task;
use serde::{Deserialize, Deserializer, Serialize};

/// Runner name used for issues produced by the in-process detector
pub const CUSTOM_DETECTOR_RUNNER: &str = "custom-detector";

/// One detected accessibility defect
///
/// Deserialization ignores fields it does not know, so scanner output with
/// extra vendor fields (`typeCode`, `runnerExtras`, ...) is accepted as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Stable identifier from the originating detector
    pub code: String,
    /// Human-readable description
    pub message: String,
    /// Severity as reported by the source (error / warning / notice)
    #[serde(
        rename = "type",
        default = "default_issue_type",
        deserialize_with = "null_as_error_type"
    )]
    pub issue_type: String,
    /// Offending markup, verbatim
    #[serde(default, deserialize_with = "null_as_empty")]
    pub context: String,
    /// CSS selector addressing the offending node at detection time
    #[serde(default, deserialize_with = "null_as_empty")]
    pub selector: String,
    /// Detector that produced the issue
    #[serde(default, deserialize_with = "null_as_empty")]
    pub runner: String,
    /// Remediation task, absent until classified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<Task>,
}

fn default_issue_type() -> String {
    "error".to_string()
}

// Scanners emit `null` for context and selector on document-level issues
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_error_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_issue_type))
}

impl Issue {
    /// Create an unclassified error-level issue
    #[inline]
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            issue_type: default_issue_type(),
            context: String::new(),
            selector: String::new(),
            runner: String::new(),
            task_type: None,
        }
    }

    /// With severity/category string
    #[inline]
    #[must_use]
    pub fn with_type(mut self, issue_type: impl Into<String>) -> Self {
        self.issue_type = issue_type.into();
        self
    }

    /// With offending markup snippet
    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// With node selector
    #[inline]
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    /// With runner name
    #[inline]
    #[must_use]
    pub fn with_runner(mut self, runner: impl Into<String>) -> Self {
        self.runner = runner.into();
        self
    }

    /// With assigned task
    #[inline]
    #[must_use]
    pub fn with_task(mut self, task: Task) -> Self {
        self.task_type = Some(task);
        self
    }

    /// Whether classification has run for this issue
    #[inline]
    #[must_use]
    pub fn is_classified(&self) -> bool {
        self.task_type.is_some()
    }

    /// Whether this issue came from the in-process detector
    #[inline]
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.runner == CUSTOM_DETECTOR_RUNNER
    }
}

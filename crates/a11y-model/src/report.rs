//! Pipeline report
//!
//! A [`Report`] is assembled once at the end of a run through
//! [`ReportBuilder`] and never modified afterwards.

use crate::issue::Issue;
use crate::task::Task;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Aggregate output of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Issues found by all detectors, before filtering
    pub total_issues: usize,
    /// Issues left in the remediation set
    pub filtered_issues: usize,
    /// Per-task counts over all classified issues; every task is present
    pub categorized_counts: BTreeMap<Task, usize>,
    /// The filtered issues, in detection order
    pub issues: Vec<Issue>,
    /// Caller-supplied context, echoed back verbatim
    pub context: Value,
    /// Maximum filtered issue count that still passes
    pub threshold: usize,
    /// `filtered_issues <= threshold`
    pub pass_threshold: bool,
    /// Identifier of the run that produced this report
    pub run_id: String,
}

impl Report {
    /// Count for one task (zero when absent)
    #[inline]
    #[must_use]
    pub fn count_for(&self, task: Task) -> usize {
        self.categorized_counts.get(&task).copied().unwrap_or(0)
    }
}

/// Builder for [`Report`]
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    run_id: String,
    total: usize,
    counts: BTreeMap<Task, usize>,
    issues: Vec<Issue>,
    context: Value,
    threshold: usize,
}

impl ReportBuilder {
    /// Start a report for the given run
    #[must_use]
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            counts: Task::all().into_iter().map(|t| (t, 0)).collect(),
            ..Self::default()
        }
    }

    /// Record every detected issue (classified, before filtering)
    #[must_use]
    pub fn with_all_issues(mut self, all: &[Issue]) -> Self {
        self.total = all.len();
        for task in all.iter().filter_map(|i| i.task_type) {
            *self.counts.entry(task).or_insert(0) += 1;
        }
        self
    }

    /// Set the remediation set
    #[inline]
    #[must_use]
    pub fn with_filtered(mut self, filtered: Vec<Issue>) -> Self {
        self.issues = filtered;
        self
    }

    /// Set the caller context object
    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// Set the pass/fail threshold
    #[inline]
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Build the immutable report
    #[must_use]
    pub fn build(self) -> Report {
        let filtered_issues = self.issues.len();
        Report {
            total_issues: self.total,
            filtered_issues,
            categorized_counts: self.counts,
            issues: self.issues,
            context: self.context,
            threshold: self.threshold,
            pass_threshold: filtered_issues <= self.threshold,
            run_id: self.run_id,
        }
    }
}

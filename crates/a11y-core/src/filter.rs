//! Task Filter
//!
//! Include/exclude policy over classified issues. Exclusion wins when a
//! task appears in both lists; two empty lists keep everything.

use crate::error::ConfigurationError;
use a11y_model::{Issue, Task};

/// Include/exclude policy resolved to the task enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    include: Vec<Task>,
    exclude: Vec<Task>,
}

impl TaskFilter {
    /// Create a filter from resolved task lists
    #[inline]
    #[must_use]
    pub fn new(include: Vec<Task>, exclude: Vec<Task>) -> Self {
        Self { include, exclude }
    }

    /// Create a filter from task names
    ///
    /// # Errors
    /// - `ConfigurationError::UnknownTask` for the first name outside the enumeration
    pub fn from_names<I, E, S>(include: I, exclude: E) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::new(Task::parse_list(include)?, Task::parse_list(exclude)?))
    }

    /// Included tasks
    #[inline]
    #[must_use]
    pub fn include(&self) -> &[Task] {
        &self.include
    }

    /// Excluded tasks
    #[inline]
    #[must_use]
    pub fn exclude(&self) -> &[Task] {
        &self.exclude
    }

    /// Whether issues of `task` pass the policy
    #[must_use]
    pub fn keeps(&self, task: Task) -> bool {
        if self.exclude.contains(&task) {
            return false;
        }
        self.include.is_empty() || self.include.contains(&task)
    }

    /// Whether `issue` passes; an unclassified issue passes only an open include list
    #[must_use]
    pub fn keeps_issue(&self, issue: &Issue) -> bool {
        issue
            .task_type
            .map_or(self.include.is_empty(), |task| self.keeps(task))
    }

    /// Issues that pass, in their original order
    #[must_use]
    pub fn apply(&self, issues: &[Issue]) -> Vec<Issue> {
        issues
            .iter()
            .filter(|issue| self.keeps_issue(issue))
            .cloned()
            .collect()
    }
}

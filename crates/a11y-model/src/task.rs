//! Remediation task categories
//!
//! A [`Task`] is a pure enumeration value: it is looked up or compared, it
//! never owns state. The declaration order is the canonical ordering used
//! for reports and CLI listings.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Remediation category assigned to every classified issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Task {
    /// Missing or improper alternative text for images
    AltText,
    /// Button and control accessibility (names, roles, purpose)
    Button,
    /// Skip navigation / bypass blocks
    SkipContent,
    /// Semantic HTML structure; catch-all category
    SemanticStructure,
}

impl Task {
    /// All tasks in canonical order
    #[inline]
    #[must_use]
    pub const fn all() -> [Task; 4] {
        [
            Task::AltText,
            Task::Button,
            Task::SkipContent,
            Task::SemanticStructure,
        ]
    }

    /// Wire name of the task (`ALT_TEXT`, `BUTTON`, ...)
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Task::AltText => "ALT_TEXT",
            Task::Button => "BUTTON",
            Task::SkipContent => "SKIP_CONTENT",
            Task::SemanticStructure => "SEMANTIC_STRUCTURE",
        }
    }

    /// Parse a list of task names, failing on the first unknown name
    ///
    /// # Errors
    /// - `ModelError::UnknownTask` naming the offending entry
    pub fn parse_list<I, S>(names: I) -> Result<Vec<Task>, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| name.as_ref().parse())
            .collect()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Task::all()
            .into_iter()
            .find(|t| t.as_str() == trimmed)
            .ok_or_else(|| ModelError::unknown_task(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for task in Task::all() {
            assert_eq!(task.as_str().parse::<Task>().unwrap(), task);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "IMAGES".parse::<Task>().unwrap_err();
        assert!(matches!(err, ModelError::UnknownTask { ref name, .. } if name == "IMAGES"));
        assert!(err.to_string().contains("ALT_TEXT"));
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!("alt_text".parse::<Task>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Task::SkipContent).unwrap();
        assert_eq!(json, "\"SKIP_CONTENT\"");
        let back: Task = serde_json::from_str("\"SEMANTIC_STRUCTURE\"").unwrap();
        assert_eq!(back, Task::SemanticStructure);
    }

    #[test]
    fn parse_list_stops_at_unknown() {
        assert_eq!(
            Task::parse_list(["BUTTON", "ALT_TEXT"]).unwrap(),
            vec![Task::Button, Task::AltText]
        );
        assert!(Task::parse_list(["BUTTON", "NOPE"]).is_err());
    }
}

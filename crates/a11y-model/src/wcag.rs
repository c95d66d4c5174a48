//! WCAG success criterion → task mapping
//!
//! The table is built once (usually at process start) and passed by
//! reference to whoever classifies issues. It is the sole source of truth
//! for table-based classification; nothing mutates it after construction.

use crate::task::Task;
use serde::Serialize;

/// One row of the mapping table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WcagMapping {
    /// Dotted success criterion id, e.g. `1.1.1`
    pub wcag_id: &'static str,
    /// Task the criterion maps to
    pub task_type: Task,
    /// Criterion title
    pub description: &'static str,
}

/// Immutable lookup table of WCAG mappings
#[derive(Debug, Clone)]
pub struct WcagMappingTable {
    rows: Vec<WcagMapping>,
}

const STANDARD_ROWS: &[(&str, Task, &str)] = &[
    // 1.1 Text Alternatives
    ("1.1.1", Task::AltText, "Non-text Content"),
    // 2.1 Keyboard Accessible
    ("2.1.1", Task::Button, "Keyboard"),
    ("2.1.2", Task::Button, "No Keyboard Trap"),
    // 2.4 Navigable
    ("2.4.1", Task::SkipContent, "Bypass Blocks"),
    ("2.4.3", Task::SkipContent, "Focus Order"),
    ("2.4.4", Task::Button, "Link Purpose (In Context)"),
    ("2.4.6", Task::SemanticStructure, "Headings and Labels"),
    // 3.1 Readable
    ("3.1.1", Task::SemanticStructure, "Language of Page"),
    // 4.1 Compatible
    ("4.1.1", Task::SemanticStructure, "Parsing"),
    ("4.1.2", Task::Button, "Name, Role, Value"),
];

impl WcagMappingTable {
    /// Build the standard table
    #[must_use]
    pub fn standard() -> Self {
        Self {
            rows: STANDARD_ROWS
                .iter()
                .map(|&(wcag_id, task_type, description)| WcagMapping {
                    wcag_id,
                    task_type,
                    description,
                })
                .collect(),
        }
    }

    /// Look up the task for a dotted criterion id
    #[inline]
    #[must_use]
    pub fn lookup(&self, wcag_id: &str) -> Option<Task> {
        self.rows
            .iter()
            .find(|row| row.wcag_id == wcag_id)
            .map(|row| row.task_type)
    }

    /// All rows in declaration order
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[WcagMapping] {
        &self.rows
    }

    /// Number of mapped criteria
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for WcagMappingTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_maps_known_criteria() {
        let table = WcagMappingTable::standard();
        assert_eq!(table.lookup("1.1.1"), Some(Task::AltText));
        assert_eq!(table.lookup("2.4.1"), Some(Task::SkipContent));
        assert_eq!(table.lookup("4.1.2"), Some(Task::Button));
        assert_eq!(table.lookup("3.1.1"), Some(Task::SemanticStructure));
    }

    #[test]
    fn unmapped_criterion_is_none() {
        let table = WcagMappingTable::standard();
        assert_eq!(table.lookup("1.3.1"), None);
        assert_eq!(table.lookup(""), None);
    }

    #[test]
    fn criterion_ids_are_unique() {
        let table = WcagMappingTable::standard();
        let mut ids: Vec<_> = table.rows().iter().map(|r| r.wcag_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), table.len());
    }
}

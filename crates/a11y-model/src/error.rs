//! Error types for the model crate

/// Errors raised while interpreting model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A task name outside the closed enumeration
    #[error("unknown task '{name}' (expected one of: {expected})")]
    UnknownTask {
        /// The rejected name
        name: String,
        /// Comma-separated list of valid names
        expected: String,
    },
}

impl ModelError {
    /// Create unknown task error listing all valid task names
    pub fn unknown_task(name: impl Into<String>) -> Self {
        Self::UnknownTask {
            name: name.into(),
            expected: crate::Task::all()
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

//! Error types for document handling

/// Errors raised while parsing or querying a document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Selector text is not valid CSS
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector {
        /// The rejected selector
        selector: String,
        /// Parser diagnostic
        message: String,
    },

    /// Input contains no markup at all
    #[error("document is empty")]
    EmptyDocument,
}

impl DomError {
    /// Create invalid selector error
    pub fn invalid_selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for document operations
pub type DomResult<T> = Result<T, DomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_selector_display() {
        let err = DomError::invalid_selector("##", "unexpected token");
        assert_eq!(err.to_string(), "invalid selector '##': unexpected token");
    }
}

//! Error types for detection
//!
//! Both detection stages are fatal on failure; there is no partial result.

use a11y_dom::DomError;
use a11y_llm::GenerationError;
use std::path::PathBuf;

/// External scanner failure
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Scanner process could not be started
    #[error("failed to start scanner '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Scanner exited with a failure status
    #[error("scanner failed with status {status:?}: {stderr}")]
    Failed {
        /// Exit code, absent when killed by a signal
        status: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// Scanner output is not the expected JSON
    #[error("unparsable scanner output: {0}")]
    UnparsableOutput(String),

    /// Document to scan is not accessible
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Custom detector failure
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// Document query failed
    #[error("document error: {0}")]
    Dom(#[from] DomError),

    /// Semantic judgment call failed
    #[error("semantic rule failed: {0}")]
    Generation(#[from] GenerationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_display_includes_stderr() {
        let err = ScanError::Failed {
            status: Some(1),
            stderr: "Chrome not found".into(),
        };
        assert_eq!(err.to_string(), "scanner failed with status Some(1): Chrome not found");
    }

    #[test]
    fn dom_error_converts() {
        let err: DetectError = DomError::EmptyDocument.into();
        assert!(matches!(err, DetectError::Dom(_)));
    }
}

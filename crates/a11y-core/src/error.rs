//! Error types for the pipeline
//!
//! Every stage failure is fatal for the run. Per-entry application problems
//! are not errors: they are [`a11y_dom::PatchOutcome`] values in the
//! remediation summary.

use a11y_detect::{DetectError, ScanError};
use a11y_dom::DomError;
use a11y_llm::GenerationError;
use a11y_model::ModelError;
use std::path::PathBuf;

/// Invalid or incomplete configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// Include or exclude list names a task outside the enumeration
    #[error("{0}")]
    UnknownTask(#[from] ModelError),

    /// A model call can happen but no credential is configured
    #[error("missing credential: set {env} or llm.api_key")]
    MissingCredential {
        /// Environment variable consulted
        env: &'static str,
    },

    /// Configuration file cannot be read or parsed
    #[error("invalid config file {path}: {message}")]
    InvalidFile { path: PathBuf, message: String },

    /// A setting is out of range
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

impl ConfigurationError {
    /// Create invalid file error
    pub fn invalid_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create invalid value error
    pub fn invalid_value(key: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            message: message.into(),
        }
    }
}

/// Fatal pipeline failure
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Configuration rejected before any work started
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// External scanner failed
    #[error("scan failed: {0}")]
    Scan(#[from] ScanError),

    /// Custom detector failed
    #[error("detection failed: {0}")]
    Detection(#[from] DetectError),

    /// Model call failed after its retry budget
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Temporary document could not be written
    #[error("failed to materialize document in {dir}: {source}")]
    Materialize {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document could not be parsed or queried
    #[error("document error: {0}")]
    Dom(#[from] DomError),
}

impl PipelineError {
    /// Create materialization error
    pub fn materialize(dir: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Materialize {
            dir: dir.into(),
            source,
        }
    }

    /// Process exit status reported to the host
    ///
    /// `0` and `1` are reserved for completed runs (pass / threshold exceeded).
    #[inline]
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 2,
            Self::Scan(_) => 3,
            Self::Generation(_) | Self::Detection(DetectError::Generation(_)) => 4,
            Self::Detection(_) | Self::Materialize { .. } | Self::Dom(_) => 5,
        }
    }
}

/// Result alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

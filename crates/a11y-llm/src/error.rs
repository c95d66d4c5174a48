//! Error types for the completion gateway
//!
//! Provides error handling for:
//! - Transport failures (network, HTTP status, response decoding)
//! - Generation failures (response lacks the required shape)
//! - Image input validation

use std::path::PathBuf;

/// Failure talking to the completion service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Request could not be sent or the connection failed
    #[error("network error: {0}")]
    Network(String),

    /// Service answered with a non-success status
    #[error("service returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as far as it could be read
        body: String,
    },

    /// Response body did not have the expected structure
    #[error("could not decode response: {0}")]
    Decode(String),

    /// Client could not be constructed
    #[error("client setup failed: {0}")]
    Setup(String),
}

impl TransportError {
    /// Create status error
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Check if the failure is worth re-sending (all but setup failures)
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Setup(_))
    }
}

/// Invalid image input
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// File extension outside the accepted set
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    /// Image file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Inline data is not valid base64
    #[error("invalid base64 image data: {0}")]
    InvalidBase64(String),

    /// Image decoded to zero bytes
    #[error("image data is empty")]
    Empty,
}

impl ImageError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A completion that lacks the required shape
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Output delimiters absent from the completion
    #[error("completion has no output envelope")]
    EnvelopeMissing,

    /// Payload is not valid JSON or lacks a required field
    #[error("completion payload is malformed: {0}")]
    JsonInvalid(String),

    /// Completion had no content
    #[error("completion is empty")]
    EmptyCompletion,

    /// Alt-text response parsed but carried no `altText`
    #[error("response has no altText")]
    MissingAltText,

    /// Page summarization returned nothing
    #[error("page summary is empty")]
    EmptySummary,

    /// Retry budget spent
    #[error("gave up after {attempts} attempts, last failure: {last}")]
    RetriesExhausted {
        /// Attempts made, including the first
        attempts: u32,
        /// Failure of the final attempt
        last: Box<GenerationError>,
    },

    /// Transport failure
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// Image input rejected
    #[error("image: {0}")]
    Image(#[from] ImageError),
}

impl GenerationError {
    /// Check if a fresh attempt may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::EnvelopeMissing | Self::JsonInvalid(_) | Self::EmptyCompletion => true,
            Self::Transport(t) => t.is_retryable(),
            _ => false,
        }
    }

    /// Name of the stage that failed
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::EnvelopeMissing => "missing envelope",
            Self::JsonInvalid(_) => "malformed JSON",
            Self::EmptyCompletion => "empty response",
            Self::MissingAltText => "missing alt text",
            Self::EmptySummary => "empty summary",
            Self::RetriesExhausted { last, .. } => last.stage(),
            Self::Transport(_) => "transport",
            Self::Image(_) => "image input",
        }
    }

    /// Create malformed payload error
    pub fn json_invalid(message: impl Into<String>) -> Self {
        Self::JsonInvalid(message.into())
    }
}

/// Result type alias for gateway operations
pub type GenerationResult<T> = Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_failures_are_retryable() {
        assert!(GenerationError::EnvelopeMissing.is_retryable());
        assert!(GenerationError::json_invalid("eof").is_retryable());
        assert!(!GenerationError::MissingAltText.is_retryable());
        assert!(!GenerationError::EmptySummary.is_retryable());
    }

    #[test]
    fn round_trip_failures_are_retried() {
        assert!(TransportError::status(503, "busy").is_retryable());
        assert!(TransportError::Network("reset".into()).is_retryable());
        assert!(!TransportError::Setup("tls".into()).is_retryable());
    }

    #[test]
    fn exhausted_names_last_stage() {
        let err = GenerationError::RetriesExhausted {
            attempts: 4,
            last: Box::new(GenerationError::EnvelopeMissing),
        };
        assert_eq!(err.stage(), "missing envelope");
        assert!(err.to_string().contains("4 attempts"));
    }
}

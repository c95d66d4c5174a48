//! A11y Detect
//!
//! Issue detection for the remediation pipeline.
//!
//! # Components
//!
//! - [`IssueScanner`] / [`CommandScanner`]: external checker run against a
//!   materialized document file, its JSON report normalized into issues
//! - [`CustomDetector`]: in-process rules for what the checker misses,
//!   one deterministic and one delegated to the LLM gateway
//!
//! Both produce [`a11y_model::Issue`] values of the same shape, so the
//! pipeline simply concatenates their output.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod detector;
pub mod error;
pub mod scanner;

// Re-exports for convenience
pub use detector::{CustomDetector, BUTTON_NAME_CODE, CONTROL_SEMANTICS_CODE};
pub use error::{DetectError, ScanError};
pub use scanner::{parse_report, CommandScanner, IssueScanner, DEFAULT_PROGRAM};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! A11y Core
//!
//! Classification, filtering and the end-to-end remediation pipeline.
//!
//! # Core Concepts
//!
//! - [`TaskClassifier`]: Total `Issue → Task` mapping over the WCAG table
//! - [`TaskFilter`]: Include/exclude policy where exclusion wins
//! - [`Remediator`]: Task-specific prompts and fix generation per issue
//! - [`Pipeline`]: scan → detect → classify → filter → remediate → apply → report
//! - [`PipelineConfig`]: Layered TOML/env/flag configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use a11y_core::{Pipeline, PipelineConfig, RunMode};
//!
//! let config = PipelineConfig::from_file(path)?.with_env();
//! let pipeline = Pipeline::from_config(config, RunMode::Improve)?;
//! let outcome = pipeline.improve(&html, serde_json::json!({})).await?;
//! println!("{}", outcome.fixed_html);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod classify;
pub mod config;
pub mod error;
pub mod filter;
pub mod hook;
pub mod pipeline;
pub mod remediation;

// Re-exports for convenience
pub use classify::{wcag_id, TaskClassifier};
pub use config::{
    DetectorConfig, LlmConfig, PipelineConfig, RemediationConfig, RunMode, ScannerConfig, API_KEY_ENV,
};
pub use error::{ConfigurationError, PipelineError, PipelineResult};
pub use filter::TaskFilter;
pub use hook::{DiffLogHook, PostProcessHook};
pub use pipeline::{Pipeline, PipelineOutcome, RemediationEntry, RemediationStatus, RemediationSummary};
pub use remediation::{page_context_from, task_prompt, Planned, RemediationJob, Remediator, SkipReason};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! A11y Model
//!
//! Shared data model for the accessibility remediation pipeline.
//!
//! # Core Concepts
//!
//! - [`Issue`]: One normalized accessibility defect, from the external scanner
//!   or the custom detector
//! - [`Task`]: Closed, ordered set of remediation categories
//! - [`WcagMappingTable`]: Immutable WCAG success-criterion → task lookup
//! - [`Report`]: Aggregate result of one pipeline run
//! - [`FixProposal`]: Ephemeral model-proposed fix consumed by the patcher
//!
//! # Example
//!
//! ```rust,ignore
//! use a11y_model::{Task, WcagMappingTable};
//!
//! let table = WcagMappingTable::standard();
//! assert_eq!(table.lookup("1.1.1"), Some(Task::AltText));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod error;
mod issue;
mod proposal;
mod report;
mod task;
mod wcag;

// Re-exports
pub use error::ModelError;
pub use issue::{Issue, CUSTOM_DETECTOR_RUNNER};
pub use proposal::{payload_markup, AltTextProposal, FixProposal, Relevancy};
pub use report::{Report, ReportBuilder};
pub use task::Task;
pub use wcag::{WcagMapping, WcagMappingTable};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! A11y DOM
//!
//! The boundary between raw HTML text and the pipeline's view of a document.
//!
//! # Core Operations
//!
//! - **Parse**: Wrap markup in an [`HtmlDocument`] that remembers its source
//! - **Address**: Generate CSS selectors for detected nodes ([`unique_selector`])
//! - **Condense**: Strip non-semantic noise before prompting ([`condense`])
//! - **Patch**: Replace nodes by selector with proposed markup ([`FixApplier`])
//!
//! # Architecture
//!
//! ```text
//! markup → HtmlDocument → select / condense
//!                ↓
//!          FixApplier (snapshot selectors → sequential replace) → markup'
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use a11y_dom::{FixApplier, HtmlDocument, Patch};
//!
//! let mut doc = HtmlDocument::parse("<p id=\"a\">old</p>")?;
//! let summary = FixApplier::new().apply(&mut doc, &[Patch::new("#a", "<p id=\"a\">new</p>")]);
//! assert_eq!(summary.applied(), 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod document;
pub mod error;
pub mod images;
pub mod patch;
mod render;
pub mod selector;
pub mod semantic;

// Re-exports for convenience
pub use document::HtmlDocument;
pub use error::DomError;
pub use images::{ImageElement, ImageSrc};
pub use patch::{decode_markup, FixApplier, Patch, PatchEntry, PatchOutcome, PatchSummary};
pub use selector::{path_selector, unique_selector};
pub use semantic::{condense, DEFAULT_MAX_PROMPT_CHARS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

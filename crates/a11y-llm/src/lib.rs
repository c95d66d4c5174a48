//! A11y LLM
//!
//! Gateway between the remediation pipeline and a chat-completion service.
//!
//! # Core Concepts
//!
//! - [`CompletionBackend`]: Transport seam; [`OpenAiBackend`] speaks the
//!   OpenAI-compatible chat-completions protocol
//! - [`LlmGateway`]: Alt text, relevancy, page summaries and structured
//!   fixes on top of a backend, with a bounded retry loop
//! - [`Envelope`]: Typed parser for delimiter-wrapped model output
//!
//! # Example
//!
//! ```rust,ignore
//! use a11y_llm::{LlmGateway, OpenAiBackend, DEFAULT_BASE_URL};
//! use std::{sync::Arc, time::Duration};
//!
//! let backend = OpenAiBackend::new(api_key, DEFAULT_BASE_URL, Duration::from_secs(60))?;
//! let gateway = LlmGateway::new(Arc::new(backend));
//! let payload = gateway.solve_markup("Fix this button: <button></button>").await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod backend;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod image;
pub mod openai;
pub mod prompts;

// Re-exports for convenience
pub use backend::{ChatMessage, CompletionBackend, CompletionRequest, ContentPart, MessageContent, Role};
pub use envelope::{Envelope, EnvelopeOutcome, FIX_OUTPUT};
pub use error::{GenerationError, GenerationResult, ImageError, TransportError};
pub use gateway::{GatewayConfig, LlmGateway, PageContext, DEFAULT_MAX_RETRIES};
pub use image::ImageInput;
pub use openai::{OpenAiBackend, DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Model-proposed fixes
//!
//! Proposals are ephemeral: produced by one gateway call, handed to the
//! patcher, then dropped. They are never persisted as their own entity.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Relevancy of alt text to its page context, clamped to `[0.0, 1.0]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Relevancy(f64);

impl Relevancy {
    /// Score used whenever relevancy cannot be determined
    pub const NEUTRAL: Relevancy = Relevancy(0.5);

    /// Create a clamped score; NaN becomes [`Relevancy::NEUTRAL`]
    #[inline]
    #[must_use]
    pub fn new(score: f64) -> Self {
        if score.is_nan() {
            Self::NEUTRAL
        } else {
            Self(score.clamp(0.0, 1.0))
        }
    }

    /// Raw score
    #[inline]
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Human label for the score band
    #[must_use]
    pub fn label(&self) -> &'static str {
        if self.0 >= 0.7 {
            "highly relevant"
        } else if self.0 >= 0.4 {
            "moderately relevant"
        } else {
            "low relevance - consider removing"
        }
    }
}

impl Default for Relevancy {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl From<f64> for Relevancy {
    fn from(score: f64) -> Self {
        Self::new(score)
    }
}

impl From<Relevancy> for f64 {
    fn from(r: Relevancy) -> Self {
        r.0
    }
}

/// Typed result of the alt-text generation path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AltTextProposal {
    /// Generated alternative text
    pub alt_text: String,
    /// Relevancy to the supplied page context
    #[serde(default)]
    pub relevancy: Relevancy,
    /// Model reasoning or explanation for a defaulted score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// One proposed fix, addressed by selector
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FixProposal {
    /// Freeform payload from the generic structured-fix call
    Structured {
        /// Node the fix targets
        selector: String,
        /// Parsed JSON payload from inside the output envelope
        payload: Value,
    },
    /// Alt text generated through the vision path
    AltText {
        /// Node the fix targets (the `img` element)
        selector: String,
        /// Re-rendered element carrying the generated alt text
        markup: String,
        /// Typed proposal
        proposal: AltTextProposal,
    },
}

impl FixProposal {
    /// Selector of the node to replace
    #[inline]
    #[must_use]
    pub fn selector(&self) -> &str {
        match self {
            Self::Structured { selector, .. } | Self::AltText { selector, .. } => selector,
        }
    }

    /// Replacement markup, if the payload carries one
    ///
    /// Structured payloads provide it under `html` (or the `fixedHtml` alias).
    #[must_use]
    pub fn proposed_markup(&self) -> Option<&str> {
        match self {
            Self::Structured { payload, .. } => payload_markup(payload),
            Self::AltText { markup, .. } => Some(markup),
        }
    }
}

/// Extract replacement markup from a structured payload
#[must_use]
pub fn payload_markup(payload: &Value) -> Option<&str> {
    ["html", "fixedHtml"]
        .iter()
        .find_map(|key| payload.get(key).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty())
}

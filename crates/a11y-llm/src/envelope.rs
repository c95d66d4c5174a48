//! Output envelope parsing
//!
//! Model output is untrusted text. An [`Envelope`] names the start/end
//! delimiters a payload must be wrapped in; parsing returns a typed
//! [`EnvelopeOutcome`] and never retries. Retry policy lives in the gateway.

use serde_json::Value;

/// Start/end delimiter pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    /// Opening delimiter
    pub open: &'static str,
    /// Closing delimiter
    pub close: &'static str,
}

/// Delimiters around structured-fix payloads
pub const FIX_OUTPUT: Envelope = Envelope {
    open: "<fix_output>",
    close: "</fix_output>",
};

/// Delimiters around the relevancy score
pub const RELEVANCY: Envelope = Envelope {
    open: "<relevancy>",
    close: "</relevancy>",
};

/// Delimiters around model reasoning
pub const SCRATCHPAD: Envelope = Envelope {
    open: "<scratchpad>",
    close: "</scratchpad>",
};

/// Result of parsing a completion
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeOutcome {
    /// Payload found and parsed
    Parsed(Value),
    /// Completion was blank
    Empty,
    /// Delimiters absent
    EnvelopeMissing,
    /// Delimiters present, payload not JSON
    JsonInvalid(String),
}

impl Envelope {
    /// Text between the first `open` and the following `close`
    #[must_use]
    pub fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        let start = text.find(self.open)? + self.open.len();
        let len = text[start..].find(self.close)?;
        Some(text[start..start + len].trim())
    }

    /// Extract and parse a JSON payload
    #[must_use]
    pub fn parse_json(&self, text: &str) -> EnvelopeOutcome {
        if text.trim().is_empty() {
            return EnvelopeOutcome::Empty;
        }
        let Some(inner) = self.extract(text) else {
            return EnvelopeOutcome::EnvelopeMissing;
        };
        match serde_json::from_str(strip_code_fence(inner)) {
            Ok(value) => EnvelopeOutcome::Parsed(value),
            Err(e) => EnvelopeOutcome::JsonInvalid(e.to_string()),
        }
    }
}

/// Remove a surrounding Markdown code fence, if any
#[must_use]
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

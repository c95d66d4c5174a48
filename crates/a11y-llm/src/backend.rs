//! Completion backend abstraction
//!
//! The gateway talks to the completion service only through
//! [`CompletionBackend`]. Requests mirror the chat-completions wire shape:
//! a model id, a list of role-tagged messages whose content is either plain
//! text or a list of text / image parts, and an optional JSON-only hint.

use crate::error::TransportError;
use async_trait::async_trait;
use serde::Serialize;

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions framing the conversation
    System,
    /// The request itself
    User,
}

/// Image reference inside a message part
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrl {
    /// `data:image/<mime>;base64,...` or an absolute URL
    pub url: String,
}

/// One part of a multi-part message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text fragment
    Text {
        /// The text
        text: String,
    },
    /// Image fragment
    ImageUrl {
        /// The image reference
        image_url: ImageUrl,
    },
}

/// Message content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text
    Text(String),
    /// Text and image parts
    Parts(Vec<ContentPart>),
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Author
    pub role: Role,
    /// Content
    pub content: MessageContent,
}

impl ChatMessage {
    /// System message
    #[inline]
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Plain user message
    #[inline]
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// User message carrying text and one image
    #[must_use]
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_url.into(),
                    },
                },
            ]),
        }
    }
}

/// A single completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// Conversation
    pub messages: Vec<ChatMessage>,
    /// Ask the service for JSON-only output
    pub json_only: bool,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Create a request for `model`
    #[inline]
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            json_only: false,
            temperature: None,
        }
    }

    /// Request JSON-only output
    #[inline]
    #[must_use]
    pub fn with_json_only(mut self) -> Self {
        self.json_only = true;
        self
    }

    /// With sampling temperature
    #[inline]
    #[must_use]
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Completion service seam
///
/// Implement this trait to route gateway calls to a different service, or
/// to script responses in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run one completion and return its text (empty when the service sent none)
    async fn complete(&self, request: CompletionRequest) -> Result<String, TransportError>;

    /// Ids of all models the service offers
    async fn list_models(&self) -> Result<Vec<String>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_message_serializes_to_parts() {
        let msg = ChatMessage::user_with_image("describe", "data:image/png;base64,AAAA");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["content"][1]["type"], "image_url");
        assert_eq!(value["content"][1]["image_url"]["url"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn text_message_serializes_to_string() {
        let value = serde_json::to_value(ChatMessage::system("rules")).unwrap();
        assert_eq!(value["content"], "rules");
    }
}

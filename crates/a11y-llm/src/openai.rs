//! OpenAI-compatible HTTP backend

use crate::backend::{ChatMessage, CompletionBackend, CompletionRequest};
use crate::error::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Default service root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o";

const USER_AGENT: &str = concat!("a11y-remediation/", env!("CARGO_PKG_VERSION"));

/// Chat-completions client
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

impl OpenAiBackend {
    /// Create a backend
    ///
    /// # Arguments
    /// * `api_key` - Bearer credential
    /// * `base_url` - Service root, e.g. [`DEFAULT_BASE_URL`]
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    /// - `TransportError::Setup` if the HTTP client cannot be built
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(TransportError::status(status.as_u16(), body))
        }
    }
}

fn request_body(request: &CompletionRequest) -> ChatCompletionBody<'_> {
    ChatCompletionBody {
        model: &request.model,
        messages: &request.messages,
        temperature: request.temperature,
        response_format: request
            .json_only
            .then(|| json!({ "type": "json_object" })),
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String, TransportError> {
        debug!(model = %request.model, messages = request.messages.len(), "sending completion");
        let response = self
            .http
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request_body(&request))
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let parsed: ChatCompletionResponse = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    async fn list_models(&self) -> Result<Vec<String>, TransportError> {
        let response = self
            .http
            .get(self.endpoint("models"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let parsed: ModelList = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        Ok(parsed.data.into_iter().map(|m| m.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_only_sets_response_format() {
        let req = CompletionRequest::new("gpt-4o", vec![ChatMessage::user("hi")]).with_json_only();
        let value = serde_json::to_value(request_body(&req)).unwrap();
        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["response_format"]["type"], "json_object");
        assert!(value.get("temperature").is_none());
    }

    #[test]
    fn plain_request_has_no_response_format() {
        let req = CompletionRequest::new("m", vec![ChatMessage::user("hi")])
            .with_temperature(Some(0.2));
        let value = serde_json::to_value(request_body(&req)).unwrap();
        assert!(value.get("response_format").is_none());
        assert!(value["temperature"].is_number());
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let backend = OpenAiBackend::new("k", "http://localhost:9/v1/", Duration::from_secs(1)).unwrap();
        assert_eq!(backend.endpoint("models"), "http://localhost:9/v1/models");
    }

    #[test]
    fn response_without_content_decodes() {
        let parsed: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
                .unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}

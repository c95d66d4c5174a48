//! LLM Gateway
//!
//! Four operations, each a round-trip to the completion service with no
//! local caching:
//! - **Alt text**: vision call returning [`AltTextProposal`]
//! - **Relevancy**: scores existing alt text against page context
//! - **Summary**: condenses page markup to a short description
//! - **Structured fix**: text prompt whose answer must sit in the
//!   [`FIX_OUTPUT`] envelope as JSON
//!
//! # Retry policy
//!
//! Structured fixes and alt text run inside a bounded loop: at most
//! `max_retries + 1` attempts, each an immediate re-send of the identical
//! request. Only retryable failures (missing envelope, malformed JSON,
//! empty completion, transport) consume budget; anything else is returned
//! at once. Relevancy and summary calls are single-shot.

use crate::backend::{ChatMessage, CompletionBackend, CompletionRequest};
use crate::envelope::{strip_code_fence, EnvelopeOutcome, FIX_OUTPUT, RELEVANCY, SCRATCHPAD};
use crate::error::{GenerationError, GenerationResult};
use crate::image::ImageInput;
use crate::openai::DEFAULT_MODEL;
use crate::prompts;
use a11y_dom::{condense, HtmlDocument, DEFAULT_MAX_PROMPT_CHARS};
use a11y_model::{payload_markup, AltTextProposal, Relevancy};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default retry budget (retries after the first attempt)
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Reasoning recorded when no page context was available
pub const NO_CONTEXT_REASONING: &str = "No page context provided; relevancy defaulted to neutral";

/// Gateway tuning
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Model identifier sent with every request
    pub model: String,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Character budget for condensed markup
    pub max_prompt_chars: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            temperature: None,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
        }
    }
}

/// Page context for alt-text generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContext {
    /// Ready-made description
    Text(String),
    /// Raw page markup, summarized before use
    Markup(String),
}

/// Gateway to the completion service
#[derive(Clone)]
pub struct LlmGateway {
    backend: Arc<dyn CompletionBackend>,
    config: GatewayConfig,
}

impl std::fmt::Debug for LlmGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmGateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LlmGateway {
    /// Create a gateway with default tuning
    #[inline]
    #[must_use]
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self::with_config(backend, GatewayConfig::default())
    }

    /// Create a gateway with explicit tuning
    #[inline]
    #[must_use]
    pub fn with_config(backend: Arc<dyn CompletionBackend>, config: GatewayConfig) -> Self {
        Self { backend, config }
    }

    /// Current tuning
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn request(&self, messages: Vec<ChatMessage>) -> CompletionRequest {
        CompletionRequest::new(self.config.model.clone(), messages)
            .with_temperature(self.config.temperature)
    }

    /// Generate alt text for an image
    ///
    /// # Arguments
    /// * `image` - Image to describe
    /// * `context` - Optional page context; markup is summarized first
    ///
    /// # Returns
    /// The proposal. Without context the relevancy is [`Relevancy::NEUTRAL`]
    /// with an explanatory reasoning.
    ///
    /// # Errors
    /// - `GenerationError::Image` for invalid image input
    /// - `GenerationError::EmptySummary` if markup context summarizes to nothing
    /// - `GenerationError::MissingAltText` if the parsed response lacks `altText`
    /// - `GenerationError::RetriesExhausted` once the retry budget is spent
    pub async fn generate_alt_text(
        &self,
        image: &ImageInput,
        context: Option<&PageContext>,
    ) -> GenerationResult<AltTextProposal> {
        let image_url = image.to_url().await?;
        let context_text = match context {
            Some(PageContext::Text(text)) => Some(text.clone()),
            Some(PageContext::Markup(markup)) => Some(self.summarize_page(markup).await?),
            None => None,
        };

        let request = self
            .request(vec![
                ChatMessage::system(prompts::ALT_TEXT_SYSTEM),
                ChatMessage::user_with_image(prompts::alt_text(context_text.as_deref()), image_url),
            ])
            .with_json_only();

        let has_context = context_text.is_some();
        let request = &request;
        let proposal = self
            .with_retries("alt_text", || async move {
                let text = self.backend.complete(request.clone()).await?;
                parse_alt_text(&text, has_context)
            })
            .await?;
        info!(relevancy = proposal.relevancy.value(), "alt text generated");
        Ok(proposal)
    }

    /// Score existing alt text against page context
    ///
    /// A response without a parseable score yields [`Relevancy::NEUTRAL`].
    ///
    /// # Errors
    /// - `GenerationError::Transport` if the call fails
    pub async fn check_relevancy(
        &self,
        alt_text: &str,
        context: &str,
    ) -> GenerationResult<(Relevancy, Option<String>)> {
        let request = self.request(vec![ChatMessage::user(prompts::relevancy(alt_text, context))]);
        let text = self.backend.complete(request).await?;
        let reasoning = SCRATCHPAD.extract(&text).map(str::to_string);
        let score = RELEVANCY
            .extract(&text)
            .and_then(|s| s.parse::<f64>().ok())
            .map_or_else(
                || {
                    warn!("relevancy response had no score, using neutral");
                    Relevancy::NEUTRAL
                },
                Relevancy::new,
            );
        Ok((score, reasoning))
    }

    /// Summarize page markup in two sentences or fewer
    ///
    /// # Errors
    /// - `GenerationError::EmptySummary` if the model returns nothing
    /// - `GenerationError::Transport` if the call fails
    pub async fn summarize_page(&self, markup: &str) -> GenerationResult<String> {
        let condensed = match HtmlDocument::parse(markup) {
            Ok(doc) => condense(&doc, self.config.max_prompt_chars),
            Err(_) => String::new(),
        };
        if condensed.is_empty() {
            return Err(GenerationError::EmptySummary);
        }
        let request = self.request(vec![
            ChatMessage::system(prompts::SUMMARY_SYSTEM),
            ChatMessage::user(prompts::summary(&condensed)),
        ]);
        let summary = self.backend.complete(request).await?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(GenerationError::EmptySummary);
        }
        debug!(chars = summary.len(), "page summarized");
        Ok(summary.to_string())
    }

    /// Send a prompt and return the parsed [`FIX_OUTPUT`] envelope payload
    ///
    /// The prompt must itself ask for the envelope
    /// (see [`prompts::envelope_instructions`]).
    ///
    /// # Errors
    /// - `GenerationError::RetriesExhausted` naming the last failing stage
    pub async fn solve(&self, prompt: &str) -> GenerationResult<Value> {
        self.solve_validated(prompt, Ok).await
    }

    /// Send a structured-fix prompt whose payload must carry replacement markup
    ///
    /// Output instructions are appended to `prompt`. A payload without
    /// `html` (or `fixedHtml`) counts as malformed and consumes retry budget.
    ///
    /// # Errors
    /// - `GenerationError::RetriesExhausted` naming the last failing stage
    pub async fn solve_markup(&self, prompt: &str) -> GenerationResult<Value> {
        let prompt = format!("{prompt}\n\n{}", prompts::fix_output_instructions());
        self.solve_validated(&prompt, |payload| {
            if payload_markup(&payload).is_some() {
                Ok(payload)
            } else {
                Err(GenerationError::json_invalid("payload has no html field"))
            }
        })
        .await
    }

    /// Like [`LlmGateway::solve`], with a payload check run inside the retry loop
    ///
    /// A check failing with a retryable error consumes retry budget.
    ///
    /// # Errors
    /// - `GenerationError::RetriesExhausted` naming the last failing stage
    /// - any non-retryable error returned by `validate`
    pub async fn solve_validated<T, F>(&self, prompt: &str, validate: F) -> GenerationResult<T>
    where
        F: Fn(Value) -> GenerationResult<T>,
    {
        let request = self.request(vec![
            ChatMessage::system(prompts::FIX_SYSTEM),
            ChatMessage::user(prompt),
        ]);
        let (request, validate) = (&request, &validate);
        self.with_retries("structured_fix", || async move {
            let text = self.backend.complete(request.clone()).await?;
            match FIX_OUTPUT.parse_json(&text) {
                EnvelopeOutcome::Parsed(payload) => validate(payload),
                EnvelopeOutcome::Empty => Err(GenerationError::EmptyCompletion),
                EnvelopeOutcome::EnvelopeMissing => Err(GenerationError::EnvelopeMissing),
                EnvelopeOutcome::JsonInvalid(e) => Err(GenerationError::JsonInvalid(e)),
            }
        })
        .await
    }

    /// Ids of vision-capable models
    ///
    /// Falls back to the configured model when the listing fails or finds none.
    pub async fn list_vision_models(&self) -> Vec<String> {
        match self.backend.list_models().await {
            Ok(ids) => {
                let vision: Vec<String> = ids
                    .into_iter()
                    .filter(|id| id.contains("gpt-4o") || id.contains("vision"))
                    .collect();
                if vision.is_empty() {
                    vec![self.config.model.clone()]
                } else {
                    vision
                }
            }
            Err(e) => {
                warn!(error = %e, "model listing failed, using configured model");
                vec![self.config.model.clone()]
            }
        }
    }

    async fn with_retries<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> GenerationResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = GenerationResult<T>>,
    {
        let attempts = self.config.max_retries.saturating_add(1);
        let mut last = GenerationError::EmptyCompletion;
        for n in 1..=attempts {
            match attempt().await {
                Ok(value) => {
                    debug!(operation, attempt = n, "generation succeeded");
                    return Ok(value);
                }
                Err(e) if e.is_retryable() => {
                    warn!(operation, attempt = n, of = attempts, stage = e.stage(), error = %e, "generation attempt failed");
                    last = e;
                }
                Err(e) => return Err(e),
            }
        }
        Err(GenerationError::RetriesExhausted {
            attempts,
            last: Box::new(last),
        })
    }
}

fn parse_alt_text(text: &str, has_context: bool) -> GenerationResult<AltTextProposal> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(GenerationError::EmptyCompletion);
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| GenerationError::json_invalid(e.to_string()))?;
    let alt_text = value
        .get("altText")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(GenerationError::MissingAltText)?
        .to_string();
    let reasoning = value
        .get("reasoning")
        .and_then(Value::as_str)
        .map(str::to_string);

    if !has_context {
        return Ok(AltTextProposal {
            alt_text,
            relevancy: Relevancy::NEUTRAL,
            reasoning: Some(NO_CONTEXT_REASONING.to_string()),
        });
    }
    let relevancy = value
        .get("relevancy")
        .and_then(Value::as_f64)
        .map_or(Relevancy::NEUTRAL, Relevancy::new);
    Ok(AltTextProposal {
        alt_text,
        relevancy,
        reasoning,
    })
}

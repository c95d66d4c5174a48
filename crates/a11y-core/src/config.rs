//! Pipeline configuration
//!
//! Layered as CLI flag > environment > file > defaults. The file is TOML:
//!
//! ```toml
//! threshold = 2
//! include_tasks = ["BUTTON", "ALT_TEXT"]
//!
//! [llm]
//! model = "gpt-4o"
//! max_retries = 3
//!
//! [scanner]
//! program = "pa11y"
//! args = ["--reporter", "json"]
//!
//! [detector]
//! semantic_rule = false
//!
//! [remediation]
//! concurrency = 4
//! asset_root = "public"
//! ```

use crate::error::ConfigurationError;
use crate::filter::TaskFilter;
use a11y_detect::{CommandScanner, DEFAULT_PROGRAM};
use a11y_dom::DEFAULT_MAX_PROMPT_CHARS;
use a11y_llm::{GatewayConfig, LlmGateway, OpenAiBackend, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_MODEL};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the completion service credential
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Completion service settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    /// Bearer credential; the environment overrides the file
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Service root
    pub base_url: String,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout_secs: 60,
            temperature: None,
        }
    }
}

/// External scanner settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerConfig {
    /// Program to run
    pub program: String,
    /// Arguments placed before the document URL
    pub args: Vec<String>,
    /// Directory for materialized documents; the system temp dir when unset
    pub work_dir: Option<PathBuf>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: vec!["--reporter".to_string(), "json".to_string()],
            work_dir: None,
        }
    }
}

/// Custom detector settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Run the model-judged control semantics rule
    pub semantic_rule: bool,
    /// Character budget for condensed markup in prompts
    pub max_prompt_chars: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            semantic_rule: true,
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
        }
    }
}

/// Remediation settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemediationConfig {
    /// Generation calls in flight at once
    pub concurrency: usize,
    /// Re-scan the fixed document
    pub verify: bool,
    /// Directory that relative image `src` values resolve against
    pub asset_root: Option<PathBuf>,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            verify: false,
            asset_root: None,
        }
    }
}

/// What a run is going to do, which decides what must be configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Detect, classify and report
    Report,
    /// Report, then generate and apply fixes
    Improve,
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Completion service
    pub llm: LlmConfig,
    /// External scanner
    pub scanner: ScannerConfig,
    /// Custom detector
    pub detector: DetectorConfig,
    /// Fix generation and application
    pub remediation: RemediationConfig,
    /// Largest filtered issue count that still passes
    pub threshold: usize,
    /// Tasks to remediate; empty means all
    pub include_tasks: Vec<String>,
    /// Tasks never remediated; wins over inclusion
    pub exclude_tasks: Vec<String>,
}

impl PipelineConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// - `ConfigurationError::InvalidFile` naming `origin` if the text does not parse
    pub fn from_toml_str(text: &str, origin: impl Into<PathBuf>) -> Result<Self, ConfigurationError> {
        toml::from_str(text).map_err(|e| ConfigurationError::invalid_file(origin, e.to_string()))
    }

    /// Load a TOML file
    ///
    /// # Errors
    /// - `ConfigurationError::InvalidFile` if it cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::invalid_file(path, e.to_string()))?;
        Self::from_toml_str(&text, path)
    }

    /// Apply environment overrides from the process environment
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides read through `lookup`
    #[must_use]
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        self
    }

    /// With credential
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.llm.api_key = Some(api_key.into());
        self
    }

    /// With model identifier
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.llm.model = model.into();
        self
    }

    /// With pass/fail threshold
    #[inline]
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// With include list
    #[inline]
    #[must_use]
    pub fn with_include_tasks(mut self, tasks: Vec<String>) -> Self {
        self.include_tasks = tasks;
        self
    }

    /// With exclude list
    #[inline]
    #[must_use]
    pub fn with_exclude_tasks(mut self, tasks: Vec<String>) -> Self {
        self.exclude_tasks = tasks;
        self
    }

    /// With or without the semantic detector rule
    #[inline]
    #[must_use]
    pub fn with_semantic_rule(mut self, enabled: bool) -> Self {
        self.detector.semantic_rule = enabled;
        self
    }

    /// With or without the verification re-scan
    #[inline]
    #[must_use]
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.remediation.verify = verify;
        self
    }

    /// With asset root for local images
    #[inline]
    #[must_use]
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.remediation.asset_root = Some(root.into());
        self
    }

    /// Whether `mode` will call the completion service
    #[must_use]
    pub fn needs_model(&self, mode: RunMode) -> bool {
        mode == RunMode::Improve || self.detector.semantic_rule
    }

    /// Check the configuration for `mode` and resolve the task filter
    ///
    /// # Errors
    /// - `ConfigurationError::UnknownTask` for a task name outside the enumeration
    /// - `ConfigurationError::MissingCredential` if a model call can happen without one
    /// - `ConfigurationError::InvalidValue` for out-of-range settings
    pub fn validate(&self, mode: RunMode) -> Result<TaskFilter, ConfigurationError> {
        let filter = TaskFilter::from_names(&self.include_tasks, &self.exclude_tasks)?;
        if self.needs_model(mode) && self.api_key().is_none() {
            return Err(ConfigurationError::MissingCredential { env: API_KEY_ENV });
        }
        if self.remediation.concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "remediation.concurrency",
                "must be at least 1",
            ));
        }
        if self.detector.max_prompt_chars == 0 {
            return Err(ConfigurationError::invalid_value(
                "detector.max_prompt_chars",
                "must be at least 1",
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigurationError::invalid_value("llm.model", "must not be empty"));
        }
        Ok(filter)
    }

    /// Non-blank credential, if any
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.llm.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Gateway tuning derived from this configuration
    #[must_use]
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            model: self.llm.model.clone(),
            max_retries: self.llm.max_retries,
            temperature: self.llm.temperature,
            max_prompt_chars: self.detector.max_prompt_chars,
        }
    }

    /// Build a gateway over the OpenAI-compatible backend
    ///
    /// # Errors
    /// - `ConfigurationError::MissingCredential` without a credential
    /// - `ConfigurationError::InvalidValue` if the HTTP client cannot be built
    pub fn build_gateway(&self) -> Result<LlmGateway, ConfigurationError> {
        let api_key = self
            .api_key()
            .ok_or(ConfigurationError::MissingCredential { env: API_KEY_ENV })?;
        let backend = OpenAiBackend::new(
            api_key,
            self.llm.base_url.clone(),
            Duration::from_secs(self.llm.request_timeout_secs),
        )
        .map_err(|e| ConfigurationError::invalid_value("llm", e.to_string()))?;
        Ok(LlmGateway::with_config(Arc::new(backend), self.gateway_config()))
    }

    /// Build the external scanner
    #[must_use]
    pub fn build_scanner(&self) -> CommandScanner {
        CommandScanner::new(self.scanner.program.clone(), self.scanner.args.clone())
    }

    /// Directory for materialized documents
    #[must_use]
    pub fn work_dir(&self) -> PathBuf {
        self.scanner
            .work_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

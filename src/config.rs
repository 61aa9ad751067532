//! Configuration types for document analysis.
//!
//! Everything the pipeline can be tuned with lives in [`AnalysisConfig`],
//! built via [`AnalysisConfigBuilder`]. Callers set only what they care
//! about and rely on the documented defaults for the rest.

use crate::error::DocuMindError;
use crate::pipeline::llm::ContentGenerator;
use crate::progress::ProgressCallback;
use crate::prompts::{AnalysisMode, DEFAULT_MINDMAP_BUDGET, DEFAULT_TEXT_BUDGET};
use std::fmt;
use std::sync::Arc;

/// Provider used when none is named.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Model used when none is named.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Value shipped in the sample `.env`; treated the same as a missing key.
pub const PLACEHOLDER_API_KEY: &str = "your_actual_api_key_here";

/// Configuration for an analysis session.
///
/// Built via [`AnalysisConfig::builder()`] or using
/// [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use documind::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .provider_name("openai")
///     .model("gpt-4.1-mini")
///     .max_retries(1)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// LLM provider name (e.g. "gemini", "openai", "anthropic", "ollama").
    /// Default: "gemini".
    pub provider_name: String,

    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`] for Gemini and
    /// the provider's own default otherwise.
    pub model: Option<String>,

    /// Pre-constructed generator. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn ContentGenerator>>,

    /// Sampling temperature. Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens the model may generate per request. Default: 4096.
    ///
    /// A 700-word summary is about 1 000 tokens; the headroom covers verbose
    /// models and large mind maps.
    pub max_tokens: usize,

    /// Retries after a transient failure. Default: 2.
    ///
    /// Authentication failures are never retried.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-request timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Characters of document text sent with a summary request. Default: 8000.
    pub summary_char_budget: usize,

    /// Characters of document text sent with a question. Default: 8000.
    pub answer_char_budget: usize,

    /// Characters of document text sent with a mind-map request. Default: 6000.
    pub mindmap_char_budget: usize,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional model-call progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER.to_string(),
            model: None,
            provider: None,
            temperature: 0.3,
            max_tokens: 4096,
            max_retries: 2,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            summary_char_budget: DEFAULT_TEXT_BUDGET,
            answer_char_budget: DEFAULT_TEXT_BUDGET,
            mindmap_char_budget: DEFAULT_MINDMAP_BUDGET,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn ContentGenerator>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("summary_char_budget", &self.summary_char_budget)
            .field("answer_char_budget", &self.answer_char_budget)
            .field("mindmap_char_budget", &self.mindmap_char_budget)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// Character budget for the given request kind.
    pub fn char_budget(&self, mode: AnalysisMode) -> usize {
        match mode {
            AnalysisMode::Summarize => self.summary_char_budget,
            AnalysisMode::Answer => self.answer_char_budget,
            AnalysisMode::Mindmap => self.mindmap_char_budget,
        }
    }

    /// Model to request from the provider.
    pub fn effective_model(&self) -> &str {
        match self.model.as_deref() {
            Some(m) if !m.is_empty() => m,
            _ => default_model_for(&self.provider_name),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn ContentGenerator>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn summary_char_budget(mut self, chars: usize) -> Self {
        self.config.summary_char_budget = chars;
        self
    }

    pub fn answer_char_budget(mut self, chars: usize) -> Self {
        self.config.answer_char_budget = chars;
        self
    }

    pub fn mindmap_char_budget(mut self, chars: usize) -> Self {
        self.config.mindmap_char_budget = chars;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, DocuMindError> {
        let c = &self.config;
        if c.provider.is_none() && c.provider_name.trim().is_empty() {
            return Err(DocuMindError::InvalidConfig(
                "provider name must not be empty".into(),
            ));
        }
        for (label, budget) in [
            ("summary", c.summary_char_budget),
            ("answer", c.answer_char_budget),
            ("mindmap", c.mindmap_char_budget),
        ] {
            if budget == 0 {
                return Err(DocuMindError::InvalidConfig(format!(
                    "{label} character budget must be ≥ 1"
                )));
            }
        }
        if c.api_timeout_secs == 0 {
            return Err(DocuMindError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Environment variable holding the API key for `provider`, if it needs one.
pub fn api_key_var(provider: &str) -> Option<&'static str> {
    match provider.to_lowercase().as_str() {
        "gemini" | "google" => Some("GEMINI_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        "anthropic" | "claude" => Some("ANTHROPIC_API_KEY"),
        "mistral" => Some("MISTRAL_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        _ => None,
    }
}

/// Check that `value` is a usable API key.
///
/// Empty and placeholder values are rejected so that a freshly copied
/// `.env` template fails at startup instead of on the first request.
pub fn validate_api_key(var: &str, value: Option<&str>) -> Result<(), DocuMindError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() && v != PLACEHOLDER_API_KEY => Ok(()),
        _ => Err(DocuMindError::MissingApiKey {
            var: var.to_string(),
        }),
    }
}

fn default_model_for(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openai" => "gpt-4.1-mini",
        "anthropic" | "claude" => "claude-sonnet-4-20250514",
        "mistral" => "mistral-small-latest",
        "ollama" => "llama3.2",
        _ => DEFAULT_MODEL,
    }
}

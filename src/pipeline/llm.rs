//! The LLM boundary: one prompt in, one block of text out.
//!
//! [`ContentGenerator`] is the only thing the rest of the crate knows about
//! the model. [`ProviderGenerator`] implements it on top of any
//! `edgequake_llm` provider; tests implement it with a stub that records the
//! prompt it was handed.
//!
//! ## Retry Strategy
//!
//! Each attempt is bounded by `api_timeout_secs`. Timeouts and transport
//! errors are retried with exponential backoff, starting at
//! `retry_backoff_ms` and doubling per retry up to one minute. Authentication
//! failures and other permanent 4xx rejections are surfaced immediately.

use crate::config::{api_key_var, validate_api_key, AnalysisConfig};
use crate::error::DocuMindError;
use crate::prompts::AnalysisMode;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Something that turns a prompt into text.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Send `prompt` as a single user turn and return the model's reply.
    async fn generate_content(&self, prompt: &str) -> Result<String, DocuMindError>;

    /// Name shown in logs and the CLI footer.
    fn describe(&self) -> String {
        "custom generator".to_string()
    }
}

/// [`ContentGenerator`] backed by an `edgequake_llm` provider.
pub struct ProviderGenerator {
    provider: Arc<dyn LLMProvider>,
    label: String,
    options: CompletionOptions,
}

impl ProviderGenerator {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        label: impl Into<String>,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            provider,
            label: label.into(),
            options: build_options(config),
        }
    }
}

#[async_trait]
impl ContentGenerator for ProviderGenerator {
    async fn generate_content(&self, prompt: &str) -> Result<String, DocuMindError> {
        let messages = vec![ChatMessage::user(prompt)];
        match self.provider.chat(&messages, Some(&self.options)).await {
            Ok(response) => {
                debug!(
                    "{}: {} input tokens, {} output tokens",
                    self.label, response.prompt_tokens, response.completion_tokens
                );
                Ok(response.content)
            }
            Err(e) => Err(classify_failure(e.to_string())),
        }
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Build `CompletionOptions` from the analysis config.
fn build_options(config: &AnalysisConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Longest pause between two attempts.
const MAX_BACKOFF_MS: u64 = 60_000;

/// An HTTP status code as providers print it: at the start of the message or
/// after `HTTP`, `status`, `code` or `error`. Bare digit runs elsewhere (request
/// ids, byte counts) do not count.
static STATUS_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:^|\bhttp(?:/[\d.]+)?|\bstatus(?:[ _]?code)?|\bcode|\berror)[\s:=(\[]*([1-5]\d{2})\b",
    )
    .unwrap()
});

/// Credential complaints in the phrasing used by the major APIs.
const AUTH_PHRASES: &[&str] = &[
    "unauthorized",
    "invalid api key",
    "api key not valid",
    "api_key_invalid",
    "permission denied",
    "authentication",
];

/// The HTTP status a provider error message reports, if any.
pub fn status_code(message: &str) -> Option<u16> {
    STATUS_CODE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Map a provider error message onto the error taxonomy.
///
/// 401/403 and credential phrases become [`DocuMindError::AuthError`]. Any
/// other 4xx except 408 and 429 becomes [`DocuMindError::ModelRejected`].
/// Everything else is treated as transient.
pub fn classify_failure(message: String) -> DocuMindError {
    let lower = message.to_lowercase();
    let status = status_code(&message);

    if matches!(status, Some(401 | 403)) || AUTH_PHRASES.iter().any(|p| lower.contains(p)) {
        return DocuMindError::AuthError { detail: message };
    }
    match status {
        Some(code @ 400..=499) if code != 408 && code != 429 => DocuMindError::ModelRejected {
            status: code,
            message,
        },
        _ => DocuMindError::ModelInvocation {
            message,
            attempts: 1,
        },
    }
}

/// Delay before retry number `retry` (1-based): `base` doubled per retry,
/// capped at [`MAX_BACKOFF_MS`].
fn backoff_delay(base_ms: u64, retry: u32) -> u64 {
    base_ms
        .saturating_mul(2u64.saturating_pow(retry.saturating_sub(1)))
        .min(MAX_BACKOFF_MS)
}

/// Resolve the generator, from most-specific to least-specific.
///
/// 1. **Pre-built generator** (`config.provider`): used as-is.
/// 2. **Named provider** (`config.provider_name`): the API key variable for
///    that provider must hold a real key; the provider is then created via
///    [`ProviderFactory::create_llm_provider`] with the effective model.
pub fn resolve_generator(
    config: &AnalysisConfig,
) -> Result<Arc<dyn ContentGenerator>, DocuMindError> {
    if let Some(ref generator) = config.provider {
        return Ok(Arc::clone(generator));
    }

    let name = config.provider_name.to_lowercase();
    if let Some(var) = api_key_var(&name) {
        let value = std::env::var(var).ok();
        validate_api_key(var, value.as_deref())?;
    }

    let model = config.effective_model();
    let provider = ProviderFactory::create_llm_provider(&name, model).map_err(|e| {
        DocuMindError::ProviderNotConfigured {
            provider: name.clone(),
            hint: format!("{e}"),
        }
    })?;

    info!("Using {} / {}", name, model);
    Ok(Arc::new(ProviderGenerator::new(
        provider,
        format!("{name}/{model}"),
        config,
    )))
}

/// Call the generator under the configured timeout and retry policy.
///
/// Progress callbacks fire once at start, once per retry, and once at the
/// end (complete or error).
pub async fn invoke(
    generator: &Arc<dyn ContentGenerator>,
    mode: AnalysisMode,
    prompt: &str,
    config: &AnalysisConfig,
) -> Result<String, DocuMindError> {
    let start = Instant::now();
    let call_timeout = Duration::from_secs(config.api_timeout_secs);
    let cb = config.progress_callback.as_ref();

    if let Some(cb) = cb {
        cb.on_request_start(mode);
    }
    debug!("{}: prompt is {} chars", mode, prompt.chars().count());

    let mut last_err: Option<DocuMindError> = None;
    let mut attempts = 0u32;

    for attempt in 0..=config.max_retries {
        if let Some(ref err) = last_err {
            let backoff = backoff_delay(config.retry_backoff_ms, attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                mode, attempt, config.max_retries, backoff
            );
            if let Some(cb) = cb {
                cb.on_request_retry(mode, attempt, err.to_string());
            }
            sleep(Duration::from_millis(backoff)).await;
        }
        attempts += 1;

        let outcome = match timeout(call_timeout, generator.generate_content(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(DocuMindError::ApiTimeout {
                secs: config.api_timeout_secs,
            }),
        };

        match outcome {
            Ok(text) => {
                debug!(
                    "{}: {} chars back after {:?}",
                    mode,
                    text.chars().count(),
                    start.elapsed()
                );
                if let Some(cb) = cb {
                    cb.on_request_complete(mode, text.chars().count());
                }
                return Ok(text);
            }
            Err(e) if e.is_retryable() => {
                warn!("{}: attempt {} failed: {}", mode, attempt + 1, e);
                last_err = Some(e);
            }
            Err(e) => {
                warn!("{}: non-retryable failure: {}", mode, e);
                if let Some(cb) = cb {
                    cb.on_request_error(mode, e.to_string());
                }
                return Err(e);
            }
        }
    }

    let message = match last_err {
        Some(DocuMindError::ModelInvocation { message, .. }) => message,
        Some(other) => other.to_string(),
        None => "Unknown error".to_string(),
    };
    let err = DocuMindError::ModelInvocation { message, attempts };
    if let Some(cb) = cb {
        cb.on_request_error(mode, err.to_string());
    }
    Err(err)
}

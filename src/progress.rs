//! Progress-callback trait for model-call events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to be told when
//! a model request starts, retries, and finishes. Every LLM round-trip blocks
//! the interaction until it returns, so this is the only way a front-end can
//! show that something is happening.
//!
//! # Example
//!
//! ```rust
//! use documind::{AnalysisConfig, AnalysisMode, AnalysisProgressCallback};
//! use std::sync::Arc;
//!
//! struct Announce;
//!
//! impl AnalysisProgressCallback for Announce {
//!     fn on_request_start(&self, mode: AnalysisMode) {
//!         eprintln!("{} …", mode.activity());
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(Announce) as Arc<dyn AnalysisProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::prompts::AnalysisMode;
use std::sync::Arc;

/// Called by the responder around each model request.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called just before the first attempt of a request is sent.
    fn on_request_start(&self, mode: AnalysisMode) {
        let _ = mode;
    }

    /// Called before a retry after a transient failure.
    ///
    /// `attempt` is 1-indexed: the first retry reports `1`.
    fn on_request_retry(&self, mode: AnalysisMode, attempt: u32, error: String) {
        let _ = (mode, attempt, error);
    }

    /// Called when the model returned text.
    fn on_request_complete(&self, mode: AnalysisMode, response_chars: usize) {
        let _ = (mode, response_chars);
    }

    /// Called when the request failed for good.
    fn on_request_error(&self, mode: AnalysisMode, error: String) {
        let _ = (mode, error);
    }
}

/// A no-op implementation, handy as a default.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Type alias for a shared, dynamically-dispatched progress callback.
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

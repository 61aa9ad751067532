//! # documind
//!
//! Summarise a PDF, ask questions about it, and turn it into a mind map,
//! using a hosted LLM for everything beyond text extraction.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL, check %PDF magic
//!  ├─ 2. Extract   concatenate per-page text via pdfium (spawn_blocking)
//!  ├─ 3. Respond   truncate to budget, fill prompt, one model round-trip
//!  │               (per-call timeout, bounded retry on transient failures)
//!  ├─ 4. Parse     mind map only: fenced-JSON extraction + tree validation
//!  └─ 5. Session   document, summary, mind map and Q&A log in one value
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use documind::{resolve_input, AnalysisConfig, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY from the environment.
//!     let config = AnalysisConfig::default();
//!     let mut session = Session::new(config)?;
//!
//!     let upload = resolve_input("paper.pdf", 120).await?;
//!     session.load_document(upload).await?;
//!
//!     println!("{}", session.summarize().await?);
//!     let turn = session.ask("What dataset was used?").await?;
//!     println!("{}", turn.answer);
//!
//!     let tree = session.generate_mindmap().await?;
//!     print!("{}", documind::render::outline(tree));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `documind` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! documind = { version = "0.1", default-features = false }
//! ```
//!
//! ## Testing without a model
//!
//! Anything implementing [`ContentGenerator`] can stand in for the LLM via
//! [`AnalysisConfigBuilder::provider`]; no API key is read in that case.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod render;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use error::DocuMindError;
pub use pipeline::extract::{extract_text, ExtractedText};
pub use pipeline::input::{resolve_input, UploadedFile};
pub use pipeline::llm::{ContentGenerator, ProviderGenerator};
pub use pipeline::mindmap::{generate_mindmap, parse_mindmap, MindmapNode};
pub use pipeline::respond::respond;
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::AnalysisMode;
pub use session::{ConversationLog, ConversationTurn, Document, Session};

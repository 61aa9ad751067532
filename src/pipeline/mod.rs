//! Pipeline stages for document analysis.
//!
//! Each submodule implements exactly one step, so every step can be tested
//! on its own and the model can be swapped out behind [`llm::ContentGenerator`].
//!
//! ## Data Flow
//!
//! ```text
//!                          ┌──▶ respond ──▶ postprocess   (summary)
//! input ──▶ extract ──text─┼──▶ respond                   (answer)
//! (path/URL) (pdfium)      └──▶ respond ──▶ mindmap       (tree)
//!                                 │
//!                                llm (timeout + retry)
//! ```
//!
//! 1. [`input`]: resolve a path or URL to PDF bytes, checking the magic
//! 2. [`extract`]: concatenate per-page text; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`respond`]: truncate to the mode's character budget, fill the prompt
//!    template, call the model
//! 4. [`llm`]: the model boundary, with per-call timeout and bounded
//!    retry; the only stage with network I/O besides URL download
//! 5. [`mindmap`]: pull the JSON payload out of a fenced reply and validate
//!    the tree shape
//! 6. [`postprocess`]: tidy summary text before it is stored

pub mod extract;
pub mod input;
pub mod llm;
pub mod mindmap;
pub mod postprocess;
pub mod respond;

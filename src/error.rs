//! Error types for the documind library.
//!
//! Every stage of the analysis pipeline fails into the same enum,
//! [`DocuMindError`]. None of these errors is fatal to a running session:
//! the session keeps its previous state and the caller may simply retry the
//! action that failed (re-upload, re-ask, re-generate).
//!
//! The variants are grouped by the stage that produces them so a caller can
//! match on a whole family (e.g. "anything the extractor said") without
//! caring about the exact cause.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the documind library.
#[derive(Debug, Error)]
pub enum DocuMindError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input was rejected before reaching the pipeline.
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The upload is not a PDF container.
    #[error("'{filename}' is not a PDF document\nFirst bytes: {magic:?}")]
    NotAPdf { filename: String, magic: Vec<u8> },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The PDF parsed fine but reports zero pages.
    #[error("PDF appears to be empty: it has no pages")]
    EmptyDocument,

    /// Every page yielded only whitespace.
    ///
    /// Typical for scanned or image-only PDFs and for encrypted files without
    /// a recoverable text layer.
    #[error("Could not extract text from PDF: it may be image-based or encrypted")]
    NoExtractableText,

    /// The container could not be parsed at all.
    #[error("PDF could not be parsed: {detail}")]
    MalformedDocument { detail: String },

    // ── Model errors ──────────────────────────────────────────────────────
    /// The configured provider could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The API key environment variable is missing or still a placeholder.
    #[error(
        "{var} not configured! Set it in your environment or in a .env file.\n\
         Get a free Gemini key at: https://aistudio.google.com/app/apikey"
    )]
    MissingApiKey { var: String },

    /// The model call failed (transport or API level) after every attempt.
    #[error("Model invocation failed after {attempts} attempt(s): {message}")]
    ModelInvocation { message: String, attempts: u32 },

    /// The provider rejected our credentials. Retrying will not help.
    #[error("Authentication error from the LLM provider: {detail}")]
    AuthError { detail: String },

    /// The provider refused the request itself (bad model name, malformed
    /// request). Retrying will not help.
    #[error("LLM provider rejected the request (HTTP {status}): {message}")]
    ModelRejected { status: u16, message: String },

    /// A single model call exceeded the configured timeout.
    #[error("Model call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── Mindmap errors ────────────────────────────────────────────────────
    /// The extracted payload is not valid JSON.
    #[error("Error parsing mind map data: {detail}\nResponse was: {raw}")]
    MindmapParse { detail: String, raw: String },

    /// The payload is valid JSON but not a mind map tree.
    #[error("Mind map JSON is malformed at {path}: {reason}\nResponse was: {raw}")]
    MindmapSchema {
        path: String,
        reason: String,
        raw: String,
    },

    // ── Session errors ────────────────────────────────────────────────────
    /// An analysis action was requested before any document was loaded.
    #[error("No document loaded. Upload a PDF first.")]
    NoDocument,

    /// Export was requested before a summary was generated.
    #[error("Nothing to export: generate a summary first")]
    NothingToExport,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is loaded dynamically. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium.\n\
  • Place libpdfium next to the binary or in the working directory.\n\
  • Install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocuMindError {
    /// Whether retrying the same model call could plausibly succeed.
    ///
    /// Only transport-level trouble qualifies. Credentials, configuration and
    /// response-shape failures repeat identically on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DocuMindError::ApiTimeout { .. } | DocuMindError::ModelInvocation { .. }
        )
    }

    /// True for the three failures the extractor can produce.
    pub fn is_extraction_failure(&self) -> bool {
        matches!(
            self,
            DocuMindError::EmptyDocument
                | DocuMindError::NoExtractableText
                | DocuMindError::MalformedDocument { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mindmap_parse_display_carries_raw_text() {
        let e = DocuMindError::MindmapParse {
            detail: "expected value at line 1 column 1".into(),
            raw: "Sure! Here is your mind map".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("line 1 column 1"), "got: {msg}");
        assert!(msg.contains("Sure! Here is your mind map"), "got: {msg}");
    }

    #[test]
    fn model_invocation_display() {
        let e = DocuMindError::ModelInvocation {
            message: "connection reset".into(),
            attempts: 3,
        };
        assert!(e.to_string().contains("3 attempt"));
        assert!(e.to_string().contains("connection reset"));
    }

    #[test]
    fn missing_key_names_variable() {
        let e = DocuMindError::MissingApiKey {
            var: "GEMINI_API_KEY".into(),
        };
        assert!(e.to_string().starts_with("GEMINI_API_KEY not configured"));
    }

    #[test]
    fn retryable_classification() {
        assert!(DocuMindError::ApiTimeout { secs: 5 }.is_retryable());
        assert!(!DocuMindError::AuthError {
            detail: "invalid key".into()
        }
        .is_retryable());
        assert!(!DocuMindError::NoExtractableText.is_retryable());
        assert!(!DocuMindError::ModelRejected {
            status: 404,
            message: "model not found".into()
        }
        .is_retryable());
    }

    #[test]
    fn extraction_family() {
        assert!(DocuMindError::EmptyDocument.is_extraction_failure());
        assert!(DocuMindError::MalformedDocument {
            detail: "xref".into()
        }
        .is_extraction_failure());
        assert!(!DocuMindError::NoDocument.is_extraction_failure());
    }
}

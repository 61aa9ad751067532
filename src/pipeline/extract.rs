//! Text extraction: PDF bytes to plain text via pdfium.
//!
//! ## Threading
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and must not be driven from async code. The whole load-and-read
//! sequence runs on Tokio's blocking pool.
//!
//! The classification rules live in [`join_page_texts`], which is pure and
//! covered by unit tests that need no pdfium library.

use crate::error::DocuMindError;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Text extracted from a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
}

/// Extract the text layer of every page, in document order.
///
/// # Errors
/// - [`DocuMindError::MalformedDocument`] when pdfium cannot parse the bytes
/// - [`DocuMindError::EmptyDocument`] when the PDF has no pages
/// - [`DocuMindError::NoExtractableText`] when every page is blank
///   (scanned or image-only PDFs, encrypted PDFs)
pub async fn extract_text(bytes: Vec<u8>) -> Result<ExtractedText, DocuMindError> {
    tokio::task::spawn_blocking(move || extract_text_blocking(&bytes))
        .await
        .map_err(|e| DocuMindError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of [`extract_text`].
pub fn extract_text_blocking(bytes: &[u8]) -> Result<ExtractedText, DocuMindError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            // Locked without a password: there is no readable text layer.
            DocuMindError::NoExtractableText
        } else {
            DocuMindError::MalformedDocument { detail: err_str }
        }
    })?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    info!("PDF loaded: {} pages", page_count);

    let mut texts = Vec::with_capacity(page_count);
    for (idx, page) in pages.iter().enumerate() {
        // A page whose text layer cannot be read counts as blank.
        let text = page.text().map(|t| t.all()).unwrap_or_default();
        debug!("Page {}: {} chars", idx + 1, text.chars().count());
        texts.push(text);
    }

    let text = join_page_texts(page_count, texts)?;
    info!("Extracted {} chars", text.chars().count());
    Ok(ExtractedText { text, page_count })
}

/// Concatenate per-page text, each non-empty page followed by a newline.
///
/// Pages that yield nothing are skipped rather than contributing blank
/// lines.
pub fn join_page_texts<I>(page_count: usize, pages: I) -> Result<String, DocuMindError>
where
    I: IntoIterator<Item = String>,
{
    if page_count == 0 {
        return Err(DocuMindError::EmptyDocument);
    }

    let mut text = String::new();
    for page in pages {
        if !page.is_empty() {
            text.push_str(&page);
            text.push('\n');
        }
    }

    if text.trim().is_empty() {
        return Err(DocuMindError::NoExtractableText);
    }
    Ok(text)
}

/// Bind to a pdfium shared library.
///
/// Search order: `PDFIUM_LIB_PATH` (file or directory), the working
/// directory, the directory holding the executable, then system paths.
pub fn bind_pdfium() -> Result<Pdfium, DocuMindError> {
    let mut attempts: Vec<String> = Vec::new();

    if let Ok(env_path) = std::env::var("PDFIUM_LIB_PATH") {
        let result = if std::path::Path::new(&env_path).is_dir() {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                env_path.as_str(),
            ))
        } else {
            Pdfium::bind_to_library(env_path.as_str())
        };
        match result {
            Ok(bindings) => return Ok(Pdfium::new(bindings)),
            Err(e) => attempts.push(format!("PDFIUM_LIB_PATH={env_path}: {e:?}")),
        }
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().and_then(|d| d.to_str().map(str::to_string)));

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|first| match exe_dir.as_deref() {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Err(first),
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| {
            attempts.push(format!("{e:?}"));
            DocuMindError::PdfiumBindingFailed(attempts.join("; "))
        })?;

    Ok(Pdfium::new(bindings))
}

//! The analysis session: one active document plus its conversation.
//!
//! A [`Session`] owns everything that used to be ambient UI state. Every
//! operation takes the session explicitly and leaves it in one of two
//! states: updated on success, or exactly as it was on failure. Nothing is
//! half-replaced.
//!
//! ## Reset rules
//!
//! | Event                         | Document | summary / mindmap | log     |
//! |-------------------------------|----------|-------------------|---------|
//! | successful `load_document`    | replaced | cleared           | cleared |
//! | failed `load_document`        | kept     | kept              | kept    |
//! | `clear_conversation`          | kept     | kept              | cleared |
//! | `close_document`              | dropped  | dropped           | cleared |

use crate::config::AnalysisConfig;
use crate::error::DocuMindError;
use crate::pipeline::extract::extract_text;
use crate::pipeline::input::{summary_export_path, UploadedFile};
use crate::pipeline::llm::{resolve_generator, ContentGenerator};
use crate::pipeline::mindmap::{self, MindmapNode};
use crate::pipeline::postprocess::clean_summary;
use crate::pipeline::respond::respond;
use crate::prompts::AnalysisMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// The loaded PDF: its text and whatever has been derived from it.
///
/// The extracted text cannot change once the document exists; loading
/// another file creates a new `Document`.
#[derive(Debug, Clone)]
pub struct Document {
    filename: String,
    raw_text: String,
    page_count: usize,
    summary: Option<String>,
    mindmap: Option<MindmapNode>,
}

impl Document {
    fn new(filename: String, raw_text: String, page_count: usize) -> Self {
        Self {
            filename,
            raw_text,
            page_count,
            summary: None,
            mindmap: None,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Pages reported by the PDF; 0 for documents loaded from plain text.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Length of the extracted text in characters.
    pub fn char_count(&self) -> usize {
        self.raw_text.chars().count()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn mindmap(&self) -> Option<&MindmapNode> {
        self.mindmap.as_ref()
    }
}

/// One question and the answer the model gave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

/// Append-only question/answer history for the active document.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns in the order they were asked.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConversationTurn> {
        self.turns.iter()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    fn push(&mut self, turn: ConversationTurn) -> &ConversationTurn {
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }
}

impl<'a> IntoIterator for &'a ConversationLog {
    type Item = &'a ConversationTurn;
    type IntoIter = std::slice::Iter<'a, ConversationTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

/// A single user's analysis session.
pub struct Session {
    config: AnalysisConfig,
    generator: Arc<dyn ContentGenerator>,
    document: Option<Document>,
    log: ConversationLog,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("generator", &self.generator.describe())
            .field("document", &self.document.as_ref().map(Document::filename))
            .field("turns", &self.log.len())
            .finish()
    }
}

impl Session {
    /// Start an empty session.
    ///
    /// The model provider is resolved here, so a missing or placeholder API
    /// key fails before any document is touched.
    pub fn new(config: AnalysisConfig) -> Result<Self, DocuMindError> {
        let generator = resolve_generator(&config)?;
        Ok(Self {
            config,
            generator,
            document: None,
            log: ConversationLog::new(),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Human-readable name of the model backend.
    pub fn generator_name(&self) -> String {
        self.generator.describe()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn conversation(&self) -> &ConversationLog {
        &self.log
    }

    /// Extract `upload` and make it the active document.
    ///
    /// On failure the previous document and conversation are left as they
    /// were.
    pub async fn load_document(&mut self, upload: UploadedFile) -> Result<&Document, DocuMindError> {
        let UploadedFile { filename, bytes } = upload;
        let extracted = extract_text(bytes).await?;
        Ok(self.replace_document(Document::new(
            filename,
            extracted.text,
            extracted.page_count,
        )))
    }

    /// Make already-extracted text the active document.
    ///
    /// Same replacement rules as [`Session::load_document`]; whitespace-only
    /// text is rejected with [`DocuMindError::NoExtractableText`].
    pub fn load_text(
        &mut self,
        filename: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<&Document, DocuMindError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DocuMindError::NoExtractableText);
        }
        Ok(self.replace_document(Document::new(filename.into(), text, 0)))
    }

    fn replace_document(&mut self, document: Document) -> &Document {
        info!(
            "Loaded '{}': {} pages, {} chars",
            document.filename,
            document.page_count,
            document.char_count()
        );
        self.log.clear();
        self.document.insert(document)
    }

    /// Summarise the active document and store the result.
    pub async fn summarize(&mut self) -> Result<&str, DocuMindError> {
        let doc = self.document.as_ref().ok_or(DocuMindError::NoDocument)?;
        let raw = respond(
            &self.generator,
            AnalysisMode::Summarize,
            &doc.raw_text,
            None,
            &self.config,
        )
        .await?;

        let summary = clean_summary(&raw);
        debug!("Summary: {} chars after cleanup", summary.chars().count());
        let doc = self.document.as_mut().ok_or(DocuMindError::NoDocument)?;
        Ok(doc.summary.insert(summary).as_str())
    }

    /// Answer `question` from the active document and append the turn.
    ///
    /// The question is recorded verbatim. Blank questions are rejected
    /// without calling the model; a failed call appends nothing.
    pub async fn ask(&mut self, question: &str) -> Result<&ConversationTurn, DocuMindError> {
        if question.trim().is_empty() {
            return Err(DocuMindError::InvalidInput {
                input: question.to_string(),
                reason: "question is empty".into(),
            });
        }
        let doc = self.document.as_ref().ok_or(DocuMindError::NoDocument)?;
        let answer = respond(
            &self.generator,
            AnalysisMode::Answer,
            &doc.raw_text,
            Some(question),
            &self.config,
        )
        .await?;

        Ok(self.log.push(ConversationTurn {
            question: question.to_string(),
            answer,
        }))
    }

    /// Build a mind map of the active document and store it.
    ///
    /// Either a complete, validated tree is stored or nothing changes.
    pub async fn generate_mindmap(&mut self) -> Result<&MindmapNode, DocuMindError> {
        let doc = self.document.as_ref().ok_or(DocuMindError::NoDocument)?;
        let tree = mindmap::generate_mindmap(&self.generator, &doc.raw_text, &self.config).await?;
        let doc = self.document.as_mut().ok_or(DocuMindError::NoDocument)?;
        Ok(doc.mindmap.insert(tree))
    }

    pub fn clear_conversation(&mut self) {
        self.log.clear();
    }

    /// Drop the active document and its conversation.
    pub fn close_document(&mut self) -> Option<Document> {
        self.log.clear();
        self.document.take()
    }

    /// Write the stored summary to `<dir>/<filename>_summary.txt`.
    pub async fn export_summary(&self, dir: &Path) -> Result<PathBuf, DocuMindError> {
        let doc = self.document.as_ref().ok_or(DocuMindError::NoDocument)?;
        let summary = doc.summary.as_deref().ok_or(DocuMindError::NothingToExport)?;

        let path = summary_export_path(dir, &doc.filename);
        let mut contents = summary.to_string();
        contents.push('\n');
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| DocuMindError::OutputWriteFailed {
                path: path.clone(),
                source,
            })?;

        info!("Summary written to {}", path.display());
        Ok(path)
    }
}

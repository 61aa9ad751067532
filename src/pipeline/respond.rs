//! Prompt assembly and the single model round-trip behind every request.

use crate::config::AnalysisConfig;
use crate::error::DocuMindError;
use crate::pipeline::llm::{self, ContentGenerator};
use crate::prompts::{self, truncate_chars, AnalysisMode};
use std::sync::Arc;
use tracing::debug;

/// Build the prompt for `mode`, truncating `document_text` to `budget`
/// characters first.
///
/// `question` is required for [`AnalysisMode::Answer`] and ignored otherwise.
pub fn build_prompt(
    mode: AnalysisMode,
    document_text: &str,
    question: Option<&str>,
    budget: usize,
) -> Result<String, DocuMindError> {
    let excerpt = truncate_chars(document_text, budget);
    if excerpt.len() < document_text.len() {
        debug!(
            "{}: document truncated from {} to {} chars",
            mode,
            document_text.chars().count(),
            budget
        );
    }

    let prompt = match mode {
        AnalysisMode::Summarize => prompts::summary_prompt(excerpt),
        AnalysisMode::Mindmap => prompts::mindmap_prompt(excerpt),
        AnalysisMode::Answer => {
            let question = question.ok_or_else(|| DocuMindError::InvalidInput {
                input: String::new(),
                reason: "a question is required".into(),
            })?;
            prompts::answer_prompt(excerpt, question)
        }
    };
    Ok(prompt)
}

/// Ask the model for a summary, an answer, or a raw mind-map response.
///
/// Returns the model's text untouched; callers decide whether to clean or
/// parse it.
pub async fn respond(
    generator: &Arc<dyn ContentGenerator>,
    mode: AnalysisMode,
    document_text: &str,
    question: Option<&str>,
    config: &AnalysisConfig,
) -> Result<String, DocuMindError> {
    let prompt = build_prompt(mode, document_text, question, config.char_budget(mode))?;
    llm::invoke(generator, mode, &prompt, config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_budget_applies() {
        let text = "a".repeat(9000) + "TAIL";
        let prompt = build_prompt(AnalysisMode::Summarize, &text, None, 8000).unwrap();
        assert!(prompt.contains(&"a".repeat(8000)));
        assert!(!prompt.contains(&"a".repeat(8001)));
        assert!(!prompt.contains("TAIL"));
    }

    #[test]
    fn mindmap_uses_its_own_budget() {
        let text = "b".repeat(7000);
        let prompt = build_prompt(AnalysisMode::Mindmap, &text, None, 6000).unwrap();
        assert!(prompt.contains(&"b".repeat(6000)));
        assert!(!prompt.contains(&"b".repeat(6001)));
    }

    #[test]
    fn answer_requires_question() {
        let err = build_prompt(AnalysisMode::Answer, "doc", None, 8000).unwrap_err();
        assert!(matches!(err, DocuMindError::InvalidInput { .. }));
    }

    #[test]
    fn answer_includes_question_verbatim() {
        let prompt =
            build_prompt(AnalysisMode::Answer, "doc", Some("  Why?\n"), 8000).unwrap();
        assert!(prompt.contains("Question:   Why?\n"));
    }
}

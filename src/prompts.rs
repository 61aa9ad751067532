//! Prompt templates for summarising, answering, and mind-mapping.
//!
//! Every instruction sent to the model lives here so prompt changes never
//! touch retry or parsing logic, and so tests can inspect the exact text a
//! model would receive.
//!
//! The document text is cut to a fixed character budget before it is spliced
//! into a template (see [`truncate_chars`]). This is a plain context-window
//! guard: trailing content is dropped silently.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Budget applied to summaries and answers.
pub const DEFAULT_TEXT_BUDGET: usize = 8000;

/// Budget applied to mind-map extraction.
pub const DEFAULT_MINDMAP_BUDGET: usize = 6000;

/// Exact sentence the model is told to use when the document lacks an answer.
pub const NOT_FOUND_ANSWER: &str = "I cannot find this information in the document.";

/// Which kind of request is being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisMode {
    Summarize,
    Answer,
    Mindmap,
}

impl AnalysisMode {
    /// Short human-readable description of what the model is doing.
    pub fn activity(&self) -> &'static str {
        match self {
            AnalysisMode::Summarize => "Analyzing document structure and key points",
            AnalysisMode::Answer => "Thinking",
            AnalysisMode::Mindmap => "Extracting concepts and relationships",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnalysisMode::Summarize => "summarize",
            AnalysisMode::Answer => "answer",
            AnalysisMode::Mindmap => "mindmap",
        };
        f.write_str(s)
    }
}

/// Return the first `max_chars` characters of `text`.
///
/// Counts Unicode scalar values, not bytes, so multi-byte text is never cut
/// inside a character. Text at or under the budget is returned unchanged.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

const SUMMARY_TEMPLATE: &str = r#"You are an expert document analyst. Please provide a comprehensive summary of the following document.

Instructions:
- Identify the main topic/theme
- List 5-8 key points with detailed explanations
- Keep it comprehensive and informative (500-700 words)
- Use bullet points for clarity

Document:
{document}

Summary:"#;

const MINDMAP_TEMPLATE: &str = r#"You are an expert at extracting knowledge structures from documents.

Analyze the following document and extract a hierarchical mind map structure.

Return ONLY valid JSON in this exact format (Tree Structure):
{
    "name": "Central Topic",
    "children": [
        {
            "name": "Main Concept 1",
            "children": [
                {"name": "Sub-concept A"},
                {"name": "Sub-concept B"}
            ]
        },
        {
            "name": "Main Concept 2",
            "children": [
                {"name": "Sub-concept C"}
            ]
        }
    ]
}

Rules:
- Root node should be the main document title or central theme
- Create 3-5 main branches (level 1)
- Each main branch should have 2-4 sub-branches (level 2)
- Keep labels concise (2-5 words max)

Document:
{document}

JSON:"#;

/// Build the summary prompt. `document` must already be truncated.
pub fn summary_prompt(document: &str) -> String {
    SUMMARY_TEMPLATE.replace("{document}", document)
}

/// Build the question-answering prompt. `document` must already be truncated.
pub fn answer_prompt(document: &str, question: &str) -> String {
    format!(
        r#"You are an expert document analyst. Answer the following question based ONLY on the document content below.

Instructions:
- Provide accurate, factual answers
- Quote relevant parts if helpful
- If the answer is not in the document, say "{NOT_FOUND_ANSWER}"
- Be concise but complete

Document:
{document}

Question: {question}

Answer:"#
    )
}

/// Build the mind-map extraction prompt. `document` must already be truncated.
pub fn mindmap_prompt(document: &str) -> String {
    MINDMAP_TEMPLATE.replace("{document}", document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_chars("abc", 8000), "abc");
        assert_eq!(truncate_chars("", 10), "");
    }

    #[test]
    fn truncate_exact_budget() {
        let text = "x".repeat(8000);
        assert_eq!(truncate_chars(&text, 8000).len(), 8000);
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        let text = "éèà".repeat(4);
        let cut = truncate_chars(&text, 5);
        assert_eq!(cut.chars().count(), 5);
        assert_eq!(cut, "éèàéè");
    }

    #[test]
    fn summary_prompt_embeds_document() {
        let p = summary_prompt("THE BODY");
        assert!(p.contains("Document:\nTHE BODY\n\nSummary:"));
        assert!(p.contains("5-8 key points"));
        assert!(p.contains("500-700 words"));
    }

    #[test]
    fn answer_prompt_carries_refusal_sentence() {
        let p = answer_prompt("doc", "Who wrote it?");
        assert!(p.contains(NOT_FOUND_ANSWER));
        assert!(p.contains("Question: Who wrote it?"));
        assert!(p.contains("based ONLY on the document"));
    }

    #[test]
    fn answer_prompt_placeholders_are_literal() {
        let p = answer_prompt("see {question} below", "what is {document}?");
        assert!(p.contains("Document:\nsee {question} below\n"));
        assert!(p.contains("Question: what is {document}?"));
    }

    #[test]
    fn mindmap_prompt_keeps_json_example_braces() {
        let p = mindmap_prompt("text");
        assert!(p.contains("\"name\": \"Central Topic\""));
        assert!(p.trim_end().ends_with("JSON:"));
        assert!(p.contains("Document:\ntext\n"));
    }

    #[test]
    fn mode_display() {
        assert_eq!(AnalysisMode::Mindmap.to_string(), "mindmap");
    }
}

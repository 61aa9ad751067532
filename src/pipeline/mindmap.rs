//! Mind-map generation: pull a JSON tree out of a free-text model reply.
//!
//! Models are told to answer with bare JSON but often wrap it in a fenced
//! block, sometimes tagged ` ```json `, sometimes not, sometimes with chatter
//! around it. The payload is chosen in this order:
//!
//! 1. the interior of the first fenced block tagged `json`;
//! 2. otherwise the interior of the first fenced block of any kind;
//! 3. otherwise the whole reply.
//!
//! The payload must parse as JSON and must then have the tree shape the
//! renderer consumes: every node an object with a non-blank string `name`
//! and an optional array of child nodes. Anything else is rejected whole;
//! there is no partially accepted tree.

use crate::config::AnalysisConfig;
use crate::error::DocuMindError;
use crate::pipeline::llm::ContentGenerator;
use crate::pipeline::respond::respond;
use crate::prompts::AnalysisMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

const FENCE: &str = "```";

/// One node of a mind map.
///
/// Serialises to the renderer contract
/// `{ "name": string, "children": [ … ] }`, omitting `children` on leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindmapNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MindmapNode>,
}

impl MindmapNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<MindmapNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Levels in the tree; a lone root has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(MindmapNode::depth).max().unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MindmapNode::node_count).sum::<usize>()
    }

    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(MindmapNode::leaf_count).sum()
        }
    }

    /// Validate an arbitrary JSON value against the tree shape.
    ///
    /// On failure returns the JSON path of the offending element and why it
    /// was rejected. serde_json caps nesting at 128 levels, which bounds the
    /// recursion here.
    pub fn from_value(value: &Value) -> Result<Self, (String, String)> {
        node_from_value(value, "$")
    }
}

fn node_from_value(value: &Value, path: &str) -> Result<MindmapNode, (String, String)> {
    let obj = value
        .as_object()
        .ok_or_else(|| (path.to_string(), format!("expected an object, found {}", kind(value))))?;

    let name = match obj.get("name") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) => {
            return Err((format!("{path}.name"), "label is blank".to_string()));
        }
        Some(other) => {
            return Err((
                format!("{path}.name"),
                format!("expected a string, found {}", kind(other)),
            ));
        }
        None => return Err((path.to_string(), "missing required field `name`".to_string())),
    };

    let children = match obj.get("children") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, child)| node_from_value(child, &format!("{path}.children[{i}]")))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err((
                format!("{path}.children"),
                format!("expected an array, found {}", kind(other)),
            ));
        }
    };

    Ok(MindmapNode { name, children })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A fenced block found in a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// Info string right after the opening fence (`json`, `JSON`, or empty).
    pub tag: &'a str,
    /// Text between the tag and the closing fence (or end of input).
    pub body: &'a str,
    /// False when the reply ended before a closing fence.
    pub closed: bool,
}

enum ScanState<'a> {
    LookingForFence { from: usize },
    InsideFence { tag: &'a str, body_start: usize },
    Done,
}

/// Find every fenced block in `text`, in order.
///
/// An unterminated final block runs to the end of the text.
pub fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut state = ScanState::LookingForFence { from: 0 };

    loop {
        state = match state {
            ScanState::LookingForFence { from } => match text[from..].find(FENCE) {
                Some(rel) => {
                    let tag_start = from + rel + FENCE.len();
                    let tag_len: usize = text[tag_start..]
                        .chars()
                        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                        .map(char::len_utf8)
                        .sum();
                    ScanState::InsideFence {
                        tag: &text[tag_start..tag_start + tag_len],
                        body_start: tag_start + tag_len,
                    }
                }
                None => ScanState::Done,
            },
            ScanState::InsideFence { tag, body_start } => match text[body_start..].find(FENCE) {
                Some(rel) => {
                    let body_end = body_start + rel;
                    blocks.push(FencedBlock {
                        tag,
                        body: &text[body_start..body_end],
                        closed: true,
                    });
                    ScanState::LookingForFence {
                        from: body_end + FENCE.len(),
                    }
                }
                None => {
                    blocks.push(FencedBlock {
                        tag,
                        body: &text[body_start..],
                        closed: false,
                    });
                    ScanState::Done
                }
            },
            ScanState::Done => break,
        };
    }

    blocks
}

/// Select the JSON payload from a raw reply (see the module docs for the
/// precedence). The result is trimmed.
pub fn extract_json_payload(raw: &str) -> &str {
    let raw = raw.trim();
    let blocks = fenced_blocks(raw);

    if let Some(block) = blocks.iter().find(|b| b.tag.eq_ignore_ascii_case("json")) {
        debug!("mindmap: using ```json block (closed: {})", block.closed);
        return block.body.trim();
    }
    if let Some(block) = blocks.first() {
        debug!("mindmap: using untagged fenced block (tag: {:?})", block.tag);
        return block.body.trim();
    }
    debug!("mindmap: no fenced block, parsing whole reply");
    raw
}

/// Parse a raw model reply into a validated mind-map tree.
///
/// # Errors
/// - [`DocuMindError::MindmapParse`] when the payload is not JSON
/// - [`DocuMindError::MindmapSchema`] when it is JSON but not a tree
///
/// Both carry the full raw reply for diagnosis.
pub fn parse_mindmap(raw: &str) -> Result<MindmapNode, DocuMindError> {
    let payload = extract_json_payload(raw);

    let value: Value =
        serde_json::from_str(payload).map_err(|e| DocuMindError::MindmapParse {
            detail: e.to_string(),
            raw: raw.to_string(),
        })?;

    MindmapNode::from_value(&value).map_err(|(path, reason)| DocuMindError::MindmapSchema {
        path,
        reason,
        raw: raw.to_string(),
    })
}

/// Ask the model for a mind map of `document_text` and parse the reply.
pub async fn generate_mindmap(
    generator: &Arc<dyn ContentGenerator>,
    document_text: &str,
    config: &AnalysisConfig,
) -> Result<MindmapNode, DocuMindError> {
    let raw = respond(generator, AnalysisMode::Mindmap, document_text, None, config).await?;
    let tree = parse_mindmap(&raw)?;
    info!(
        "Mind map: {} nodes, depth {}",
        tree.node_count(),
        tree.depth()
    );
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_fence_is_parsed() {
        let raw = "```json\n{\"name\":\"A\",\"children\":[{\"name\":\"B\"}]}\n```";
        let tree = parse_mindmap(raw).unwrap();
        assert_eq!(
            tree,
            MindmapNode::new("A").with_children(vec![MindmapNode::new("B")])
        );
    }

    #[test]
    fn json_fence_preferred_over_earlier_plain_fence() {
        let raw = "Example:\n```\nnot json\n```\nAnswer:\n```json\n{\"name\":\"Root\"}\n```";
        assert_eq!(extract_json_payload(raw), "{\"name\":\"Root\"}");
    }

    #[test]
    fn untagged_fence_used_when_no_json_tag() {
        let raw = "Here you go:\n```\n{\"name\":\"X\"}\n```\nHope that helps!";
        assert_eq!(extract_json_payload(raw), "{\"name\":\"X\"}");
    }

    #[test]
    fn other_language_tag_counts_as_plain_fence() {
        let raw = "```javascript\n{\"name\":\"JS\"}\n```";
        assert_eq!(extract_json_payload(raw), "{\"name\":\"JS\"}");
    }

    #[test]
    fn uppercase_json_tag() {
        let raw = "```JSON\n{\"name\":\"Up\"}\n```";
        assert_eq!(parse_mindmap(raw).unwrap().name, "Up");
    }

    #[test]
    fn whole_reply_when_unfenced() {
        let raw = "  {\"name\":\"Bare\",\"children\":[]}  \n";
        assert_eq!(extract_json_payload(raw), "{\"name\":\"Bare\",\"children\":[]}");
        assert!(parse_mindmap(raw).unwrap().is_leaf());
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        let raw = "```json\n{\"name\":\"Open\"}";
        let blocks = fenced_blocks(raw);
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].closed);
        assert_eq!(parse_mindmap(raw).unwrap().name, "Open");
    }

    #[test]
    fn tag_on_same_line_as_payload() {
        let raw = "```json{\"name\":\"Inline\"}```";
        assert_eq!(extract_json_payload(raw), "{\"name\":\"Inline\"}");
    }

    #[test]
    fn scanner_finds_all_blocks_in_order() {
        let raw = "a```x\n1```b```\n2```c";
        let blocks = fenced_blocks(raw);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].tag, "x");
        assert_eq!(blocks[0].body, "\n1");
        assert_eq!(blocks[1].tag, "");
        assert_eq!(blocks[1].body, "\n2");
    }

    #[test]
    fn invalid_json_reports_raw_text() {
        let raw = "I'm sorry, I can't produce a mind map for this.";
        match parse_mindmap(raw).unwrap_err() {
            DocuMindError::MindmapParse { raw: carried, detail } => {
                assert_eq!(carried, raw);
                assert!(!detail.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_name_rejected_with_path() {
        let raw = r#"{"name":"Root","children":[{"name":"Ok"},{"label":"Oops"}]}"#;
        match parse_mindmap(raw).unwrap_err() {
            DocuMindError::MindmapSchema { path, reason, raw: carried } => {
                assert_eq!(path, "$.children[1]");
                assert!(reason.contains("name"));
                assert_eq!(carried, raw);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_string_name_rejected() {
        let err = parse_mindmap(r#"{"name": 42}"#).unwrap_err();
        assert!(matches!(err, DocuMindError::MindmapSchema { ref path, .. } if path == "$.name"));
    }

    #[test]
    fn children_must_be_array() {
        let err = parse_mindmap(r#"{"name":"R","children":{"name":"C"}}"#).unwrap_err();
        assert!(
            matches!(err, DocuMindError::MindmapSchema { ref path, .. } if path == "$.children")
        );
    }

    #[test]
    fn top_level_array_rejected() {
        let err = parse_mindmap(r#"[{"name":"R"}]"#).unwrap_err();
        assert!(matches!(err, DocuMindError::MindmapSchema { ref path, .. } if path == "$"));
    }

    #[test]
    fn null_children_treated_as_leaf() {
        let tree = parse_mindmap(r#"{"name":"R","children":null}"#).unwrap();
        assert!(tree.is_leaf());
    }

    #[test]
    fn serialises_to_renderer_contract() {
        let tree = MindmapNode::new("A").with_children(vec![MindmapNode::new("B")]);
        let json = serde_json::to_string(&tree).unwrap();
        assert_eq!(json, r#"{"name":"A","children":[{"name":"B"}]}"#);
    }

    #[test]
    fn tree_metrics() {
        let tree = MindmapNode::new("Root").with_children(vec![
            MindmapNode::new("One")
                .with_children(vec![MindmapNode::new("1a"), MindmapNode::new("1b")]),
            MindmapNode::new("Two"),
        ]);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.leaf_count(), 3);
    }
}

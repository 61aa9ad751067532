//! Library-level tests that run without pdfium or a network.
//!
//! The model is replaced by [`Recorder`], which replies from a script and
//! keeps every prompt it was handed so the tests can check exactly what a
//! real model would have seen.

use async_trait::async_trait;
use documind::{
    generate_mindmap, respond, AnalysisConfig, AnalysisMode, AnalysisProgressCallback,
    ContentGenerator, DocuMindError, MindmapNode, Session,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    replies: Mutex<VecDeque<Result<String, DocuMindError>>>,
    prompts: Mutex<Vec<String>>,
}

impl Recorder {
    fn replying(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn then_fail(self: &Arc<Self>, err: DocuMindError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn last_prompt(&self) -> String {
        self.prompts().pop().expect("no prompt recorded")
    }
}

#[async_trait]
impl ContentGenerator for Recorder {
    async fn generate_content(&self, prompt: &str) -> Result<String, DocuMindError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("(no scripted reply)".to_string()))
    }

    fn describe(&self) -> String {
        "recorder".to_string()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("documind=debug")
        .with_test_writer()
        .try_init();
}

fn config_with(recorder: &Arc<Recorder>) -> AnalysisConfig {
    AnalysisConfig::builder()
        .provider(recorder.clone())
        .max_retries(0)
        .build()
        .unwrap()
}

fn generator(recorder: &Arc<Recorder>) -> Arc<dyn ContentGenerator> {
    recorder.clone()
}

/// Text of `n` characters whose every position is identifiable.
fn numbered_text(n: usize) -> String {
    (0..n)
        .map(|i| char::from(b'a' + (i % 26) as u8))
        .collect()
}

// ── Truncation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn summary_sees_exactly_first_8000_chars() {
    init_tracing();
    let rec = Recorder::replying(&["summary"]);
    let text = numbered_text(8000) + "SHOULD-NOT-APPEAR";
    let config = config_with(&rec);

    respond(&generator(&rec), AnalysisMode::Summarize, &text, None, &config)
        .await
        .unwrap();

    let prompt = rec.last_prompt();
    let start = prompt
        .find("Document:\n")
        .expect("document section missing")
        + "Document:\n".len();
    let end = prompt.rfind("\n\nSummary:").expect("summary cue missing");
    assert_eq!(&prompt[start..end], &text[..8000]);
    assert!(!prompt.contains("SHOULD-NOT-APPEAR"));
}

#[tokio::test]
async fn truncation_counts_characters_not_bytes() {
    let rec = Recorder::replying(&["ok"]);
    let text = "é".repeat(8001);
    respond(&generator(&rec), AnalysisMode::Summarize, &text, None, &config_with(&rec))
        .await
        .unwrap();

    let prompt = rec.last_prompt();
    assert_eq!(prompt.matches('é').count(), 8000);
}

#[tokio::test]
async fn short_documents_are_sent_whole() {
    let rec = Recorder::replying(&["ok"]);
    let text = "A short paper about testing.";
    respond(&generator(&rec), AnalysisMode::Summarize, text, None, &config_with(&rec))
        .await
        .unwrap();
    assert!(rec.last_prompt().contains(text));
}

#[tokio::test]
async fn mindmap_sees_exactly_first_6000_chars() {
    let rec = Recorder::replying(&[r#"{"name":"Root"}"#]);
    let text = numbered_text(6000) + "TAIL-MARKER";

    generate_mindmap(&generator(&rec), &text, &config_with(&rec))
        .await
        .unwrap();

    let prompt = rec.last_prompt();
    assert!(prompt.contains(&text[..6000]));
    assert!(!prompt.contains("TAIL-MARKER"));
}

#[tokio::test]
async fn answer_prompt_carries_question_and_refusal_sentence() {
    let rec = Recorder::replying(&["42"]);
    let text = numbered_text(9000);
    let answer = respond(
        &generator(&rec),
        AnalysisMode::Answer,
        &text,
        Some("What is the answer?"),
        &config_with(&rec),
    )
    .await
    .unwrap();

    assert_eq!(answer, "42");
    let prompt = rec.last_prompt();
    assert!(prompt.contains("What is the answer?"));
    assert!(prompt.contains("I cannot find this information in the document."));
    assert!(prompt.contains(&text[..8000]));
    assert!(!prompt.contains(&text[..8001]));
}

// ── Mind map parsing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn fenced_json_reply_becomes_tree() {
    let rec = Recorder::replying(&["```json\n{\"name\":\"A\",\"children\":[{\"name\":\"B\"}]}\n```"]);
    let tree = generate_mindmap(&generator(&rec), "doc", &config_with(&rec))
        .await
        .unwrap();
    assert_eq!(
        tree,
        MindmapNode::new("A").with_children(vec![MindmapNode::new("B")])
    );
}

#[tokio::test]
async fn unfenced_invalid_json_reports_raw_reply() {
    let reply = "Sure! The main theme is {testing, with branches";
    let rec = Recorder::replying(&[reply]);
    let err = generate_mindmap(&generator(&rec), "doc", &config_with(&rec))
        .await
        .unwrap_err();

    match err {
        DocuMindError::MindmapParse { raw, detail } => {
            assert_eq!(raw, reply);
            assert!(!detail.is_empty());
        }
        other => panic!("expected MindmapParse, got {other:?}"),
    }
}

#[tokio::test]
async fn model_failure_surfaces_before_parsing() {
    let rec = Recorder::replying(&[]);
    rec.then_fail(DocuMindError::ModelInvocation {
        message: "connection refused".into(),
        attempts: 1,
    });
    let err = generate_mindmap(&generator(&rec), "doc", &config_with(&rec))
        .await
        .unwrap_err();
    assert!(matches!(err, DocuMindError::ModelInvocation { .. }));
}

// ── Session / conversation ───────────────────────────────────────────────────

#[tokio::test]
async fn conversation_log_appends_in_order() {
    let questions = ["What is it?", "Who wrote it?", "  When?  ", "Why?"];
    let answers = ["A paper.", "Someone.", "Last year.", "Because."];
    let rec = Recorder::replying(&answers);
    let mut session = Session::new(config_with(&rec)).unwrap();
    session.load_text("paper.pdf", "Body text.").unwrap();
    assert!(session.conversation().is_empty());

    let mut snapshots = Vec::new();
    for q in questions {
        session.ask(q).await.unwrap();
        snapshots.push(session.conversation().turns().to_vec());
    }

    let log = session.conversation();
    assert_eq!(log.len(), questions.len());
    for (i, turn) in log.iter().enumerate() {
        assert_eq!(turn.question, questions[i]);
        assert_eq!(turn.answer, answers[i]);
        // Earlier turns never change as later ones are appended.
        for snapshot in &snapshots[i..] {
            assert_eq!(&snapshot[i], turn);
        }
    }
}

#[tokio::test]
async fn each_question_gets_the_full_document_not_the_history() {
    let rec = Recorder::replying(&["first answer", "second answer"]);
    let mut session = Session::new(config_with(&rec)).unwrap();
    session.load_text("paper.pdf", "The body.").unwrap();

    session.ask("one?").await.unwrap();
    session.ask("two?").await.unwrap();

    let prompts = rec.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("The body."));
    assert!(prompts[1].contains("two?"));
    assert!(!prompts[1].contains("first answer"));
}

#[tokio::test]
async fn new_document_resets_derived_state() {
    let rec = Recorder::replying(&["- summary", r#"{"name":"Map"}"#, "answer"]);
    let mut session = Session::new(config_with(&rec)).unwrap();

    session.load_text("first.pdf", "First text.").unwrap();
    session.summarize().await.unwrap();
    session.generate_mindmap().await.unwrap();
    session.ask("q?").await.unwrap();
    let doc = session.document().unwrap();
    assert!(doc.summary().is_some());
    assert!(doc.mindmap().is_some());
    assert_eq!(session.conversation().len(), 1);

    session.load_text("second.pdf", "Second text.").unwrap();
    let doc = session.document().unwrap();
    assert_eq!(doc.filename(), "second.pdf");
    assert_eq!(doc.raw_text(), "Second text.");
    assert!(doc.summary().is_none());
    assert!(doc.mindmap().is_none());
    assert!(session.conversation().is_empty());
}

#[tokio::test]
async fn raw_text_survives_every_operation() {
    let rec = Recorder::replying(&["s", r#"{"name":"M"}"#, "a"]);
    let mut session = Session::new(config_with(&rec)).unwrap();
    let original = "Original extracted text.\nLine two.\n";
    session.load_text("doc.pdf", original).unwrap();

    session.summarize().await.unwrap();
    session.generate_mindmap().await.unwrap();
    session.ask("q").await.unwrap();
    session.clear_conversation();

    assert_eq!(session.document().unwrap().raw_text(), original);
}

#[tokio::test]
async fn auth_failure_is_not_retried_and_leaves_log_alone() {
    let rec = Recorder::replying(&[]);
    rec.then_fail(DocuMindError::AuthError {
        detail: "API key not valid".into(),
    });
    let config = AnalysisConfig::builder()
        .provider(rec.clone())
        .max_retries(3)
        .retry_backoff_ms(1)
        .build()
        .unwrap();
    let mut session = Session::new(config).unwrap();
    session.load_text("doc.pdf", "text").unwrap();

    let err = session.ask("anything?").await.unwrap_err();
    assert!(matches!(err, DocuMindError::AuthError { .. }));
    assert_eq!(rec.prompts().len(), 1);
    assert!(session.conversation().is_empty());
}

// ── Progress callbacks ───────────────────────────────────────────────────────

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl AnalysisProgressCallback for EventLog {
    fn on_request_start(&self, mode: AnalysisMode) {
        self.0.lock().unwrap().push(format!("start:{mode}"));
    }
    fn on_request_retry(&self, mode: AnalysisMode, attempt: u32, _error: String) {
        self.0.lock().unwrap().push(format!("retry:{mode}:{attempt}"));
    }
    fn on_request_complete(&self, mode: AnalysisMode, response_chars: usize) {
        self.0
            .lock()
            .unwrap()
            .push(format!("done:{mode}:{response_chars}"));
    }
}

#[test]
fn progress_events_follow_retries() {
    let rec = Recorder::replying(&[]);
    rec.then_fail(DocuMindError::ModelInvocation {
        message: "503".into(),
        attempts: 1,
    });
    rec.replies
        .lock()
        .unwrap()
        .push_back(Ok("recovered".into()));

    let events = Arc::new(EventLog::default());
    let config = AnalysisConfig::builder()
        .provider(rec.clone())
        .max_retries(1)
        .retry_backoff_ms(1)
        .progress_callback(events.clone())
        .build()
        .unwrap();

    let text = tokio_test::block_on(respond(
        &generator(&rec),
        AnalysisMode::Summarize,
        "doc",
        None,
        &config,
    ))
    .unwrap();

    assert_eq!(text, "recovered");
    assert_eq!(
        *events.0.lock().unwrap(),
        vec![
            "start:summarize".to_string(),
            "retry:summarize:1".to_string(),
            "done:summarize:9".to_string(),
        ]
    );
}

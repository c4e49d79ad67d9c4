//! End-to-end tests for the Cockpit pipeline.
//!
//! These drive the library crates the way the chat command does: files are
//! loaded from disk, ingested into a session, and questions are answered by
//! a scripted streaming provider.

use std::sync::Mutex;

use cockpit_config::IngestConfig;
use cockpit_core::error::{ProviderError, SessionError};
use cockpit_core::message::Role;
use cockpit_core::provider::{ChunkReceiver, Provider, ProviderRequest, StreamChunk};
use cockpit_engine::context::summary;
use cockpit_engine::{
    ABORT_MARKER, CancellationToken, ContextMode, EngineSettings, GenerationStatus, Session,
};
use cockpit_loader::{IngestPolicy, LoadedFile, load_path};
use tokio::sync::mpsc;

// ── Mock Provider ────────────────────────────────────────────────────────

/// Streams scripted deltas, optionally ending in a transport error.
struct ScriptedProvider {
    deltas: Vec<String>,
    fail_after: Option<ProviderError>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(deltas: &[&str]) -> Self {
        Self {
            deltas: deltas.iter().map(|d| d.to_string()).collect(),
            fail_after: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing(deltas: &[&str], error: ProviderError) -> Self {
        Self {
            fail_after: Some(error),
            ..Self::new(deltas)
        }
    }

    fn last_request(&self) -> ProviderRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let (tx, rx) = mpsc::channel(self.deltas.len() + 1);
        for d in &self.deltas {
            tx.send(Ok(StreamChunk::delta(d.clone()))).await.unwrap();
        }
        match &self.fail_after {
            Some(e) => tx.send(Err(e.clone())).await.unwrap(),
            None => tx.send(Ok(StreamChunk::finished(None))).await.unwrap(),
        }
        Ok(rx)
    }
}

fn session() -> Session {
    Session::new(EngineSettings::default())
}

fn last_user_content(request: &ProviderRequest) -> &str {
    let last = request.messages.last().unwrap();
    assert_eq!(last.role, Role::User);
    &last.content
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_pinned_artifact_dominates_smart_mode() {
    let mut s = session();
    let big: String = (0..400)
        .map(|i| format!("// module a line {i:03} ....."))
        .collect::<Vec<_>>()
        .join("\n");
    assert!(big.chars().count() > summary::SUMMARY_THRESHOLD_CHARS);
    s.ingest_artifact("/repo/a.rs", big.clone());
    s.ingest_artifact("/repo/b.sql", "-- database schema\n".repeat(50));
    s.pin("a.rs");

    let req = s.assemble_request("explain the database schema").unwrap();

    let a = &req.context.included[0];
    assert_eq!(a.name, "a.rs");
    assert!(a.score >= 1000);
    assert_eq!(a.form, cockpit_engine::context::ContentForm::Full);

    // b.sql: two keyword hits = 10, below the threshold; its summary is its content
    let b = &req.context.included[1];
    assert_eq!(b.name, "b.sql");
    assert_eq!(b.score, 10);
    assert_eq!(b.form, cockpit_engine::context::ContentForm::Summary);

    let final_message = req.messages.last().unwrap();
    assert!(final_message.content.contains(&big));
    assert!(final_message.content.ends_with("User Question: explain the database schema"));
}

#[tokio::test]
async fn e2e_empty_pool_sends_raw_query() {
    let mut s = session();
    let provider = ScriptedProvider::new(&["ok"]);

    s.generate(&provider, "m", "hello there", &CancellationToken::new(), |_| {})
        .await
        .unwrap();

    let request = provider.last_request();
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, Role::System);
    assert_eq!(last_user_content(&request), "hello there");
}

#[tokio::test]
async fn e2e_history_is_trimmed_to_newest_turn() {
    let mut s = session();
    // Three exchanges of 14000-char messages: 4000 tokens each, the whole budget
    for i in 0..3 {
        let text = format!("{i}").repeat(14_000);
        s.record_completed_turn(text.clone(), text);
    }

    let req = s.assemble_request("next").unwrap();
    assert_eq!(req.history_turns, 1);
    // system + one history turn + question
    assert_eq!(req.messages.len(), 3);
}

#[tokio::test]
async fn e2e_cancel_after_two_of_ten_chunks() {
    let mut s = session();
    let chunks: Vec<String> = (0..10).map(|i| format!("chunk{i};")).collect();
    let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
    let provider = ScriptedProvider::new(&refs);

    let cancel = CancellationToken::new();
    let mut seen = 0;
    let outcome = s
        .generate(&provider, "m", "stream something", &cancel, |_| {
            seen += 1;
            if seen == 2 {
                cancel.cancel();
            }
        })
        .await
        .unwrap();

    let expected = format!("chunk0;chunk1;{ABORT_MARKER}");
    assert_eq!(outcome.status, GenerationStatus::Aborted);
    assert_eq!(outcome.text, expected);

    let history = s.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "stream something");
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, expected);
}

#[tokio::test]
async fn e2e_transport_failure_keeps_partial_text_and_history_clean() {
    let mut s = session();
    let provider = ScriptedProvider::failing(
        &["partial ", "answer"],
        ProviderError::StreamInterrupted("connection reset".into()),
    );

    let outcome = s
        .generate(&provider, "m", "question", &CancellationToken::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(outcome.status, GenerationStatus::Failed);
    assert!(outcome.text.starts_with("partial answer"));
    assert!(outcome.text.contains("[ERROR: Stream interrupted: connection reset]"));
    assert!(s.history().is_empty());

    // The session accepts the next request
    let ok = ScriptedProvider::new(&["fine"]);
    let next = s
        .generate(&ok, "m", "again", &CancellationToken::new(), |_| {})
        .await
        .unwrap();
    assert_eq!(next.status, GenerationStatus::Completed);
}

#[tokio::test]
async fn e2e_blank_query_is_rejected_before_any_call() {
    let mut s = session();
    let provider = ScriptedProvider::new(&["never"]);
    let err = s
        .generate(&provider, "m", "  \n", &CancellationToken::new(), |_| {})
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::EmptyQuery);
    assert!(provider.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn e2e_load_directory_and_ask() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::create_dir_all(dir.path().join("target")).unwrap();
    std::fs::write(
        dir.path().join("src/db.rs"),
        "pub fn connect_database() {}\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("src/ui.rs"), "pub fn render() {}\n").unwrap();
    std::fs::write(dir.path().join("huge.txt"), "x".repeat(4096)).unwrap();
    std::fs::write(dir.path().join("target/out.rs"), "generated").unwrap();

    let policy = IngestPolicy::from(&IngestConfig {
        max_file_size: 1024,
        exclude_dirs: vec!["target".into()],
        ..IngestConfig::default()
    });
    let files = load_path(dir.path().to_str().unwrap(), &policy).unwrap();

    let mut s = session();
    s.set_mode(ContextMode::Full);
    let report = s.ingest_all(files.into_iter().map(LoadedFile::into_pair));
    assert_eq!(report.loaded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.pool_size, 3);

    let provider = ScriptedProvider::new(&["It connects."]);
    s.generate(&provider, "m", "how does the database connect", &CancellationToken::new(), |_| {})
        .await
        .unwrap();

    let request = provider.last_request();
    let content = last_user_content(&request);
    // db.rs matched a keyword and ranks first
    let db = content.find("--- FILE: db.rs").unwrap();
    let ui = content.find("--- FILE: ui.rs").unwrap();
    assert!(db < ui);
    assert!(!content.contains("huge.txt"));
    assert!(content.contains("=== END CONTEXT (2 files,"));
}

#[tokio::test]
async fn e2e_focus_then_reset() {
    let mut s = session();
    s.ingest_artifact("/r/payment_service.rs", "fn pay() {}");
    s.ingest_artifact("/r/main.rs", "fn main() {}");

    assert_eq!(s.focus("payment"), vec!["payment_service.rs".to_string()]);
    let req = s.assemble_request("anything at all").unwrap();
    assert_eq!(req.context.included[0].name, "payment_service.rs");
    assert!(req.context.included[0].score >= 1000);

    s.reset_session();
    let req = s.assemble_request("anything at all").unwrap();
    assert!(req.context.is_empty());
}

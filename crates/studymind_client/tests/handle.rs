use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use studymind_client::{
    AskRequest, ClientEvent, ClientHandle, ClientSettings, FailureKind, IngestStatus, PollStop,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Answers each request with the next body; the last one repeats.
struct Sequence {
    bodies: Vec<Value>,
    served: AtomicUsize,
}

impl Sequence {
    fn new(bodies: Vec<Value>) -> Self {
        Self {
            bodies,
            served: AtomicUsize::new(0),
        }
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let index = self.served.fetch_add(1, Ordering::SeqCst);
        let body = &self.bodies[index.min(self.bodies.len() - 1)];
        ResponseTemplate::new(200).set_body_json(body.clone())
    }
}

fn handle_for(server: &MockServer) -> ClientHandle {
    let settings = ClientSettings {
        poll_interval: Duration::from_millis(50),
        upload_chunk_size: 8,
        ..ClientSettings::default().with_base_url(server.uri())
    };
    ClientHandle::new(settings).expect("client starts")
}

/// Collects events until one matches `done`, failing after five seconds.
async fn collect_until(
    handle: &ClientHandle,
    done: impl Fn(&ClientEvent) -> bool,
) -> Vec<ClientEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        while let Some(event) = handle.try_recv() {
            let finished = done(&event);
            seen.push(event);
            if finished {
                return seen;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected event never arrived; saw {seen:?}");
}

fn pdf_file(contents: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    file.write_all(contents).unwrap();
    file
}

#[tokio::test(flavor = "multi_thread")]
async fn upload_then_poll_until_completed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ingest/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "accepted",
            "filename": "notes.pdf"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ingest/status"))
        .respond_with(Sequence::new(vec![
            json!({"status": "pending", "pages": 0, "chunks": 0, "error": null}),
            json!({"status": "processing", "pages": 10, "chunks": 0, "error": null}),
            json!({"status": "completed", "pages": 10, "chunks": 42, "error": null}),
        ]))
        .mount(&server)
        .await;

    let handle = handle_for(&server);
    let file = pdf_file(b"%PDF-1.4 a small but multi-chunk document");

    handle.upload("notes.pdf", file.path());
    let events = collect_until(&handle, |event| {
        matches!(event, ClientEvent::UploadFinished { .. })
    })
    .await;
    let percents: Vec<u8> = events
        .iter()
        .filter_map(|event| match event {
            ClientEvent::UploadProgress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents.last(), Some(&100));
    match events.last() {
        Some(ClientEvent::UploadFinished { name, result }) => {
            assert_eq!(name, "notes.pdf");
            assert!(result.is_ok());
        }
        other => panic!("unexpected {other:?}"),
    }

    handle.start_polling("notes.pdf");
    let events = collect_until(&handle, |event| {
        matches!(event, ClientEvent::PollingStopped { .. })
    })
    .await;
    let statuses: Vec<IngestStatus> = events
        .iter()
        .filter_map(|event| match event {
            ClientEvent::StatusPolled { report, .. } => Some(report.status),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            IngestStatus::Pending,
            IngestStatus::Processing,
            IngestStatus::Completed
        ]
    );
    assert_eq!(
        events.last(),
        Some(&ClientEvent::PollingStopped {
            name: "notes.pdf".to_string(),
            reason: PollStop::Terminal(IngestStatus::Completed),
        })
    );
    assert_eq!(handle.active_polls(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreadable_file_fails_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let handle = handle_for(&server);
    let dir = tempfile::tempdir().unwrap();
    handle.upload("missing.pdf", dir.path().join("missing.pdf"));

    let events = collect_until(&handle, |event| {
        matches!(event, ClientEvent::UploadFinished { .. })
    })
    .await;
    match events.last() {
        Some(ClientEvent::UploadFinished { result: Err(err), .. }) => {
            assert_eq!(err.kind, FailureKind::Io);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_stops_tracking_the_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ingest/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "processing", "pages": 3, "chunks": 0, "error": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/ingest/delete/notes.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "deleted"})))
        .mount(&server)
        .await;

    let handle = handle_for(&server);
    handle.start_polling("notes.pdf");
    collect_until(&handle, |event| {
        matches!(event, ClientEvent::StatusPolled { .. })
    })
    .await;
    assert!(handle.is_polling("notes.pdf"));

    handle.delete("notes.pdf");
    let events = collect_until(&handle, |event| {
        matches!(event, ClientEvent::DocumentRemoved { .. })
    })
    .await;
    assert_eq!(
        events.last(),
        Some(&ClientEvent::DocumentRemoved {
            name: "notes.pdf".to_string(),
            result: Ok(()),
        })
    );
    assert!(!handle.is_polling("notes.pdf"));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_reset_keeps_pollers_running() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ingest/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "pending", "pages": 0, "chunks": 0, "error": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/ingest/reset"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "disk full"})))
        .mount(&server)
        .await;

    let handle = handle_for(&server);
    handle.start_polling("a.pdf");
    collect_until(&handle, |event| {
        matches!(event, ClientEvent::StatusPolled { .. })
    })
    .await;

    handle.reset();
    let events = collect_until(&handle, |event| {
        matches!(event, ClientEvent::DocumentsReset { .. })
    })
    .await;
    match events.last() {
        Some(ClientEvent::DocumentsReset { result: Err(err) }) => {
            assert_eq!(err.detail.as_deref(), Some("disk full"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(handle.is_polling("a.pdf"));
    handle.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn ask_round_trip_delivers_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/qa/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Paging maps virtual to physical memory.",
            "sources": [{"page": 4, "text": "Paging is..."}]
        })))
        .mount(&server)
        .await;

    let handle = handle_for(&server);
    handle.ask(AskRequest {
        question: "What is paging?".to_string(),
        syllabus_context: None,
        marks: 5,
        chat_history: None,
    });

    let events = collect_until(&handle, |event| {
        matches!(event, ClientEvent::AnswerReceived { .. })
    })
    .await;
    match events.last() {
        Some(ClientEvent::AnswerReceived { result: Ok(response) }) => {
            assert_eq!(response.answer, "Paging maps virtual to physical memory.");
            assert_eq!(response.sources.as_ref().map(Vec::len), Some(1));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_silences_pollers_and_later_commands() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ingest/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "processing", "pages": 1, "chunks": 0, "error": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/ingest/reset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "reset"})))
        .mount(&server)
        .await;

    let handle = handle_for(&server);
    handle.start_polling("a.pdf");
    handle.start_polling("b.pdf");
    collect_until(&handle, |event| {
        matches!(event, ClientEvent::StatusPolled { .. })
    })
    .await;

    handle.shutdown();
    handle.shutdown();
    assert_eq!(handle.active_polls(), 0);
    while handle.try_recv().is_some() {}

    handle.reset();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(handle.try_recv(), None);
}
